//! Aggregation of per-system series across one result directory.

use crate::dataset::ExperimentKind;
use crate::error::{PlotError, Result};
use crate::parser::parse_file;
use crate::series::{extract, SeriesCollection};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Leaf file read when a system's entry is a directory
pub const DIR_LEAF: &str = "all.csv";

/// Maps a directory entry name to the system key it contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub name: &'static str,
    pub key: &'static str,
}

impl Entry {
    pub const fn new(name: &'static str, key: &'static str) -> Self {
        Self { name, key }
    }

    /// An entry whose directory name is also its system key
    pub const fn same(name: &'static str) -> Self {
        Self { name, key: name }
    }
}

/// Series collections for every y metric of a kind
pub type AggregatedSeries = BTreeMap<&'static str, SeriesCollection>;

/// Read every recognized entry of `dir` and group the series by metric.
///
/// Entries not in `entries` are skipped. Missing entries are not reported
/// here; a chart asking for one fails when it looks the key up.
pub fn aggregate<P: AsRef<Path>>(
    dir: P,
    kind: &ExperimentKind,
    entries: &[Entry],
) -> Result<AggregatedSeries> {
    let dir = dir.as_ref();
    let mut out: AggregatedSeries = kind
        .y
        .iter()
        .map(|m| (m.name, SeriesCollection::new()))
        .collect();

    for dir_entry in fs::read_dir(dir).map_err(|e| PlotError::io(dir, e))? {
        let dir_entry = dir_entry.map_err(|e| PlotError::io(dir, e))?;
        let file_name = dir_entry.file_name();
        let Some(entry) = entries.iter().find(|e| file_name == e.name) else {
            debug!("{}: skipping unrecognized entry {:?}", kind.name, file_name);
            continue;
        };

        let path = resolve_entry(dir_entry.path())?;
        let rows = parse_file(&path, kind)?;
        for (metric, s) in extract(&rows, kind, &path)? {
            debug!("{} [{}] {}: {:?}", kind.name, metric, entry.key, s.points());
            if let Some(collection) = out.get_mut(metric) {
                collection.insert(entry.key, s);
            }
        }
    }

    Ok(out)
}

fn resolve_entry(path: PathBuf) -> Result<PathBuf> {
    let meta = fs::metadata(&path).map_err(|e| PlotError::io(&path, e))?;
    if meta.is_dir() {
        Ok(path.join(DIR_LEAF))
    } else {
        Ok(path)
    }
}
