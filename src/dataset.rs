//! Experiment kinds: the column layout and scaling of each family of result files.

use serde::Serialize;

/// Field separator used by a result file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `a,b,c`
    Comma,
    /// `a, b, c`; the space is trimmed with the field
    CommaSpace,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma | Delimiter::CommaSpace => b',',
        }
    }
}

/// Position of a field within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Column {
    /// 0-based index from the start of the row
    Index(usize),
    /// 1-based index from the end of the row (`FromEnd(1)` is the last field)
    FromEnd(usize),
}

impl Column {
    /// Resolve against a row of `len` fields
    pub fn resolve(self, len: usize) -> Option<usize> {
        match self {
            Column::Index(i) if i < len => Some(i),
            Column::FromEnd(n) if n >= 1 && n <= len => Some(len - n),
            _ => None,
        }
    }

    /// Minimum number of fields a row needs for this column to exist
    pub fn min_width(self) -> usize {
        match self {
            Column::Index(i) => i + 1,
            Column::FromEnd(n) => n.max(1),
        }
    }
}

/// Unit conversion applied to a raw column value.
///
/// Stored as a divisor so that derived values match `raw / 1e6` exactly
/// rather than `raw * 1e-6`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    pub divisor: f64,
}

impl Scale {
    pub const NONE: Scale = Scale { divisor: 1.0 };
    /// Raw units to thousands (RPS → kRPS, ns → µs)
    pub const KILO: Scale = Scale { divisor: 1e3 };
    /// Raw units to millions (RPS → MRPS)
    pub const MEGA: Scale = Scale { divisor: 1e6 };

    pub fn apply(self, raw: f64) -> f64 {
        raw / self.divisor
    }
}

/// Predicate selecting which rows contribute to a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowFilter {
    All,
    /// Keep rows whose value in `column` lies in `[min, max]`
    Range { column: Column, min: f64, max: f64 },
}

impl RowFilter {
    pub fn column(&self) -> Option<Column> {
        match self {
            RowFilter::All => None,
            RowFilter::Range { column, .. } => Some(*column),
        }
    }

    pub fn accepts(&self, key: f64) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Range { min, max, .. } => *min <= key && key <= *max,
        }
    }
}

/// A named measurement taken from one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub column: Column,
    pub scale: Scale,
    /// Range of scaled values the figures are laid out for
    pub valid_range: Option<(f64, f64)>,
}

/// Immutable descriptor of one family of result files
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentKind {
    pub name: &'static str,
    pub delimiter: Delimiter,
    pub header_lines: usize,
    pub row_filter: RowFilter,
    pub x: Metric,
    pub y: &'static [Metric],
}

impl ExperimentKind {
    /// Every column the kind reads, x first, then y metrics, then the filter key
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        std::iter::once(self.x.column)
            .chain(self.y.iter().map(|m| m.column))
            .chain(self.row_filter.column())
    }

    /// Fewest fields a data row may have
    pub fn min_width(&self) -> usize {
        self.columns().map(Column::min_width).max().unwrap_or(0)
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.y.iter().find(|m| m.name == name)
    }
}

/// Memcached over a user-space network stack: `..., <rps>, ..., <p99.9>, _, _`
pub const MEMCACHED: ExperimentKind = ExperimentKind {
    name: "memcached",
    delimiter: Delimiter::CommaSpace,
    header_lines: 0,
    row_filter: RowFilter::All,
    x: Metric {
        name: "throughput_mrps",
        column: Column::Index(2),
        scale: Scale::MEGA,
        valid_range: Some((0.0, 2.6)),
    },
    y: &[Metric {
        name: "p999_latency",
        column: Column::FromEnd(3),
        scale: Scale::NONE,
        valid_range: Some((0.0, 500.0)),
    }],
};

/// RocksDB server with a 50% GET / 50% SCAN mix
pub const ROCKSDB: ExperimentKind = ExperimentKind {
    name: "rocksdb",
    delimiter: Delimiter::CommaSpace,
    header_lines: 0,
    row_filter: RowFilter::All,
    x: Metric {
        name: "throughput_krps",
        column: Column::Index(2),
        scale: Scale::KILO,
        valid_range: Some((0.0, 45.0)),
    },
    y: &[Metric {
        name: "p999_slowdown",
        column: Column::FromEnd(3),
        scale: Scale::NONE,
        valid_range: Some((0.0, 200.0)),
    }],
};

/// schbench thread-count sweep: `threads,wakeup_p99,rps,request_p99`
pub const SCHBENCH: ExperimentKind = ExperimentKind {
    name: "schbench",
    delimiter: Delimiter::Comma,
    header_lines: 1,
    row_filter: RowFilter::Range {
        column: Column::Index(0),
        min: 8.0,
        max: 96.0,
    },
    x: Metric {
        name: "threads",
        column: Column::Index(0),
        scale: Scale::NONE,
        valid_range: Some((0.0, 100.0)),
    },
    y: &[
        Metric {
            name: "wakeup_p99",
            column: Column::Index(1),
            scale: Scale::NONE,
            valid_range: Some((1.0, 20000.0)),
        },
        Metric {
            name: "request_p99",
            column: Column::Index(3),
            scale: Scale::NONE,
            valid_range: None,
        },
        Metric {
            name: "rps_k",
            column: Column::Index(2),
            scale: Scale::KILO,
            valid_range: None,
        },
    ],
};

/// Latency-critical side of the synthetic workload (latencies in ns)
pub const SYNTHETIC_LC: ExperimentKind = ExperimentKind {
    name: "synthetic-lc",
    delimiter: Delimiter::Comma,
    header_lines: 0,
    row_filter: RowFilter::All,
    x: Metric {
        name: "throughput_krps",
        column: Column::Index(1),
        scale: Scale::KILO,
        valid_range: Some((0.0, 360.0)),
    },
    y: &[Metric {
        name: "p99_latency",
        column: Column::FromEnd(4),
        scale: Scale::KILO,
        valid_range: Some((-30.0, 1000.0)),
    }],
};

/// Best-effort side of the synthetic workload: batch CPU share vs offered load
pub const SYNTHETIC_BE: ExperimentKind = ExperimentKind {
    name: "synthetic-be",
    delimiter: Delimiter::Comma,
    header_lines: 0,
    row_filter: RowFilter::All,
    x: Metric {
        name: "throughput_krps",
        column: Column::Index(0),
        scale: Scale::KILO,
        valid_range: Some((0.0, 310.0)),
    },
    y: &[Metric {
        name: "cpu_share",
        column: Column::FromEnd(1),
        scale: Scale::NONE,
        valid_range: Some((-0.05, 1.0)),
    }],
};
