//! Series model and extraction of (x, y) samples from parsed rows.

use crate::dataset::{Column, ExperimentKind, Metric};
use crate::error::{PlotError, Result};
use crate::parser::RawRow;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Ordered x → y mapping for one system under one experiment.
///
/// Points keep the position of the first insertion of their x;
/// a repeated x overwrites the earlier y.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, x: f64, y: f64) {
        match self.points.iter_mut().find(|(px, _)| *px == x) {
            Some(point) => point.1 = y,
            None => self.points.push((x, y)),
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl FromIterator<(f64, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let mut series = Series::new();
        for (x, y) in iter {
            series.insert(x, y);
        }
        series
    }
}

/// All series for one metric of one experiment, keyed by system
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesCollection {
    series: BTreeMap<String, Series>,
}

impl SeriesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, series: Series) {
        self.series.insert(key.into(), series);
    }

    /// Look up a system's series; absent keys are a caller error
    pub fn get(&self, key: &str) -> Result<&Series> {
        self.series.get(key).ok_or_else(|| PlotError::UnknownLabel {
            label: key.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.series.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }
}

/// Series of every y metric of a kind, produced from one parse pass
pub type MetricSeries = BTreeMap<&'static str, Series>;

fn read(row: &RawRow, column: Column, origin: &Path) -> Result<f64> {
    column
        .resolve(row.fields.len())
        .and_then(|i| row.fields[i].as_number())
        .ok_or_else(|| PlotError::MalformedRow {
            path: origin.to_path_buf(),
            line: row.line,
            reason: format!("no numeric value at {:?}", column),
        })
}

fn sample(row: &RawRow, metric: &Metric, origin: &Path) -> Result<f64> {
    Ok(metric.scale.apply(read(row, metric.column, origin)?))
}

/// Extract one series per y metric of `kind` from a single parse
pub fn extract(rows: &[RawRow], kind: &ExperimentKind, origin: &Path) -> Result<MetricSeries> {
    kind.y
        .iter()
        .map(|metric| -> Result<(&'static str, Series)> {
            Ok((metric.name, extract_metric(rows, kind, metric.name, origin)?))
        })
        .collect()
}

/// Extract the series of a single named metric
pub fn extract_metric(
    rows: &[RawRow],
    kind: &ExperimentKind,
    metric: &str,
    origin: &Path,
) -> Result<Series> {
    let metric = kind.metric(metric).ok_or_else(|| PlotError::UnknownLabel {
        label: format!("{}/{}", kind.name, metric),
    })?;
    rows.iter()
        .map(|row| -> Result<(f64, f64)> {
            Ok((sample(row, &kind.x, origin)?, sample(row, metric, origin)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Delimiter, RowFilter, Scale, MEMCACHED, SCHBENCH};
    use crate::parser::parse_str;

    const PLAIN: ExperimentKind = ExperimentKind {
        name: "plain",
        delimiter: Delimiter::Comma,
        header_lines: 1,
        row_filter: RowFilter::Range {
            column: Column::Index(0),
            min: 8.0,
            max: 96.0,
        },
        x: Metric {
            name: "x",
            column: Column::Index(0),
            scale: Scale::NONE,
            valid_range: None,
        },
        y: &[Metric {
            name: "y",
            column: Column::Index(1),
            scale: Scale::NONE,
            valid_range: None,
        }],
    };

    fn origin() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn header_and_two_rows() {
        let text = "cores,lat,rps,lat2\n8,100,5000000,30\n16,120,9000000,40\n";
        let rows = parse_str(text, &PLAIN, origin()).unwrap();
        let series = extract_metric(&rows, &PLAIN, "y", origin()).unwrap();
        assert_eq!(series.points(), &[(8.0, 100.0), (16.0, 120.0)]);
    }

    #[test]
    fn comma_space_with_negative_index() {
        let rows = parse_str("1000000, 2, 1500000, 10, 10, 250\n", &MEMCACHED, origin()).unwrap();
        let series = extract_metric(&rows, &MEMCACHED, "p999_latency", origin()).unwrap();
        assert_eq!(series.points(), &[(1.5, 10.0)]);
    }

    #[test]
    fn duplicate_x_last_write_wins() {
        let rows = parse_str("h\n8,100\n16,120\n8,90\n", &PLAIN, origin()).unwrap();
        let series = extract_metric(&rows, &PLAIN, "y", origin()).unwrap();
        assert_eq!(series.points().len(), 2);
        assert_eq!(series.points()[0], (8.0, 90.0));
    }

    #[test]
    fn one_pass_yields_all_metrics() {
        let text = "threads,lat,rps,lat2\n8,10,5000,30\n16,12,9000,40\n";
        let rows = parse_str(text, &SCHBENCH, origin()).unwrap();
        let all = extract(&rows, &SCHBENCH, origin()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["wakeup_p99"].points(), &[(8.0, 10.0), (16.0, 12.0)]);
        assert_eq!(all["request_p99"].points(), &[(8.0, 30.0), (16.0, 40.0)]);
        assert_eq!(all["rps_k"].points(), &[(8.0, 5.0), (16.0, 9.0)]);
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let rows = parse_str("h\n8,100\n", &PLAIN, origin()).unwrap();
        let err = extract_metric(&rows, &PLAIN, "p50", origin()).unwrap_err();
        assert!(matches!(err, PlotError::UnknownLabel { .. }));
    }

    #[test]
    fn collection_lookup_fails_for_missing_key() {
        let mut collection = SeriesCollection::new();
        collection.insert("skyloft", Series::from_iter([(1.0, 2.0)]));
        assert!(collection.get("skyloft").is_ok());
        assert!(matches!(
            collection.get("shenango"),
            Err(PlotError::UnknownLabel { label }) if label == "shenango"
        ));
    }
}
