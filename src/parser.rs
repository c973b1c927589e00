//! Result file parsing: split, validate and filter the rows of one file.

use crate::dataset::ExperimentKind;
use crate::error::{PlotError, Result};
use std::fs;
use std::path::Path;

/// One field of a parsed row
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A column the kind reads, already converted
    Number(f64),
    /// A column nobody reads, kept as-is
    Text(String),
}

impl Field {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(v) => Some(*v),
            Field::Text(_) => None,
        }
    }
}

/// One data line of a result file
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<Field>,
}

/// Parse a result file of the given kind
pub fn parse_file<P: AsRef<Path>>(path: P, kind: &ExperimentKind) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| PlotError::io(path, e))?;
    parse_str(&content, kind, path)
}

/// Text before the first blank line; drivers terminate some files early with one
fn data_section(content: &str) -> &str {
    let mut end = 0;
    for line in content.split_inclusive('\n') {
        if line.trim().is_empty() {
            break;
        }
        end += line.len();
    }
    &content[..end]
}

/// Parse result text; `origin` is only used in errors
pub fn parse_str(content: &str, kind: &ExperimentKind, origin: &Path) -> Result<Vec<RawRow>> {
    let width = kind.min_width();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(kind.delimiter.as_byte())
        .from_reader(data_section(content).as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate().skip(kind.header_lines) {
        let malformed = |line: usize, reason: String| PlotError::MalformedRow {
            path: origin.to_path_buf(),
            line,
            reason,
        };
        let record = record.map_err(|e| {
            let line = e.position().map_or(idx + 1, |p| p.line() as usize);
            malformed(line, e.to_string())
        })?;
        let line_num = record.position().map_or(idx + 1, |p| p.line() as usize);

        if record.len() < width {
            return Err(malformed(
                line_num,
                format!("expected at least {} fields, found {}", width, record.len()),
            ));
        }

        let mut fields: Vec<Field> = record.iter().map(|f| Field::Text(f.to_string())).collect();
        for column in kind.columns() {
            let Some(i) = column.resolve(fields.len()) else {
                return Err(malformed(line_num, format!("column {:?} out of range", column)));
            };
            if let Field::Text(text) = &fields[i] {
                let value = text.parse::<f64>().map_err(|_| {
                    malformed(line_num, format!("field {} is not numeric: '{}'", i, text))
                })?;
                fields[i] = Field::Number(value);
            }
        }

        let keep = match kind.row_filter.column() {
            Some(column) => column
                .resolve(fields.len())
                .and_then(|i| fields[i].as_number())
                .is_some_and(|key| kind.row_filter.accepts(key)),
            None => true,
        };
        if keep {
            rows.push(RawRow {
                line: line_num,
                fields,
            });
        }
    }

    if rows.is_empty() {
        return Err(PlotError::EmptyResult {
            path: origin.to_path_buf(),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Delimiter, Metric, RowFilter, Scale, MEMCACHED, SCHBENCH};
    use crate::series::extract;

    fn origin() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn keeps_boundary_rows_and_drops_outside() {
        let text = "threads,lat,rps,lat2\n4,1,2,3\n8,1,2,3\n96,1,2,3\n97,1,2,3\n";
        let rows = parse_str(text, &SCHBENCH, origin()).unwrap();
        let keys: Vec<f64> = rows.iter().map(|r| r.fields[0].as_number().unwrap()).collect();
        assert_eq!(keys, vec![8.0, 96.0]);
        assert_eq!(rows[0].line, 3);
    }

    #[test]
    fn stops_at_first_blank_line() {
        let text = "1, 2, 3, 4, 5, 6\n\n1, 2, not, a, row\n";
        let rows = parse_str(text, &MEMCACHED, origin()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn header_only_is_empty_result() {
        let err = parse_str("threads,lat,rps,lat2\n", &SCHBENCH, origin()).unwrap_err();
        assert!(matches!(err, PlotError::EmptyResult { .. }));
    }

    #[test]
    fn everything_filtered_is_empty_result() {
        let err = parse_str("h\n1,1,1,1\n128,1,1,1\n", &SCHBENCH, origin()).unwrap_err();
        assert!(matches!(err, PlotError::EmptyResult { .. }));
    }

    #[test]
    fn short_row_is_malformed() {
        let err = parse_str("h\n8,1,2,3\n16,1,2\n", &SCHBENCH, origin()).unwrap_err();
        match err {
            PlotError::MalformedRow { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_referenced_field_is_malformed() {
        let err = parse_str("h\n8,fast,2,3\n", &SCHBENCH, origin()).unwrap_err();
        assert!(matches!(err, PlotError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn unreferenced_columns_stay_text() {
        let rows = parse_str("1000000, 2, 1500000, 10, 10, 250\n", &MEMCACHED, origin()).unwrap();
        let fields = &rows[0].fields;
        assert_eq!(fields[0], Field::Text("1000000".into()));
        assert_eq!(fields[2], Field::Number(1_500_000.0));
        assert_eq!(fields[3], Field::Number(10.0));
        assert_eq!(fields[5], Field::Text("250".into()));
    }

    #[test]
    fn tolerates_trailing_whitespace_and_crlf() {
        const KIND: ExperimentKind = ExperimentKind {
            name: "plain",
            delimiter: Delimiter::Comma,
            header_lines: 0,
            row_filter: RowFilter::All,
            x: Metric {
                name: "x",
                column: Column::Index(0),
                scale: Scale::NONE,
                valid_range: None,
            },
            y: &[Metric {
                name: "y",
                column: Column::FromEnd(1),
                scale: Scale::NONE,
                valid_range: None,
            }],
        };
        let rows = parse_str("1,2 \r\n3,4\r\n", &KIND, origin()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].fields[1], Field::Number(4.0));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = parse_file("/nonexistent/benchplot/result", &MEMCACHED).unwrap_err();
        assert!(matches!(err, PlotError::Io { .. }));
    }

    #[test]
    fn parsing_twice_yields_identical_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linux_cfs.csv");
        fs::write(&path, "threads,lat,rps,lat2\n8,10,5000,30\n16,12,9000,40\n").unwrap();
        let first = extract(&parse_file(&path, &SCHBENCH).unwrap(), &SCHBENCH, &path).unwrap();
        let second = extract(&parse_file(&path, &SCHBENCH).unwrap(), &SCHBENCH, &path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["wakeup_p99"].points(), &[(8.0, 10.0), (16.0, 12.0)]);
    }

    #[test]
    fn quoted_fields_are_unwrapped() {
        let rows = parse_str("h\n\"8\",\"10\",1,2\n", &SCHBENCH, origin()).unwrap();
        assert_eq!(rows[0].fields[1], Field::Number(10.0));
    }
}
