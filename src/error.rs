//! Error taxonomy for result ingestion and chart rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a chart-generation run
#[derive(Debug, Error)]
pub enum PlotError {
    /// A result file had no usable rows after filtering
    #[error("{}: no usable rows after filtering", path.display())]
    EmptyResult { path: PathBuf },

    /// A row could not be split or indexed per the kind's column mapping
    #[error("{}:{line}: malformed row: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A chart asked for a system that was never aggregated
    #[error("unknown series label '{label}'")]
    UnknownLabel { label: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;
