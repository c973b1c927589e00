//! Logger setup and JSON Lines dumps of aggregated series.

use crate::dataset::{ExperimentKind, Metric};
use crate::series::{Series, SeriesCollection};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Initialise `env_logger`; `RUST_LOG` wins over the verbosity flag
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

/// One dumped series, carrying the columns and scaling it was read with
#[derive(Debug, Serialize)]
struct SeriesRecord<'a> {
    figure: &'a str,
    kind: &'a str,
    x: &'a Metric,
    y: &'a Metric,
    system: &'a str,
    points: &'a Series,
}

/// Writer for aggregated series, one JSON object per line
pub struct SeriesLogger {
    writer: BufWriter<File>,
    records_written: u64,
}

impl SeriesLogger {
    /// Create a new logger writing to the specified file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())
            .with_context(|| {
                format!("Failed to create series dump: {}", path.as_ref().display())
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    /// Append every series of one metric's collection
    pub fn log(
        &mut self,
        figure: &str,
        kind: &ExperimentKind,
        metric: &Metric,
        collection: &SeriesCollection,
    ) -> Result<()> {
        for (system, points) in collection.iter() {
            let record = SeriesRecord {
                figure,
                kind: kind.name,
                x: &kind.x,
                y: metric,
                system,
                points,
            };
            let json = serde_json::to_string(&record)?;
            writeln!(self.writer, "{}", json)?;
            self.records_written += 1;
        }
        Ok(())
    }

    /// Flush any buffered data
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Get the number of series written
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl Drop for SeriesLogger {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MEMCACHED;

    #[test]
    fn writes_one_line_per_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.jsonl");

        let mut collection = SeriesCollection::new();
        collection.insert("shenango", Series::from_iter([(0.5, 12.0), (1.0, 30.5)]));
        collection.insert("skyloft", Series::from_iter([(0.5, 10.0)]));

        let mut logger = SeriesLogger::new(&path).unwrap();
        logger.log("memcached", &MEMCACHED, &MEMCACHED.y[0], &collection).unwrap();
        logger.flush().unwrap();
        assert_eq!(logger.records_written(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["system"], "shenango");
        assert_eq!(lines[0]["kind"], "memcached");
        assert_eq!(lines[0]["x"]["name"], "throughput_mrps");
        assert_eq!(lines[0]["x"]["scale"]["divisor"], 1e6);
        assert_eq!(lines[0]["y"]["name"], "p999_latency");
        assert_eq!(lines[0]["y"]["column"]["FromEnd"], 3);
        assert_eq!(lines[0]["points"][1][1], 30.5);
        assert_eq!(lines[1]["system"], "skyloft");
    }
}
