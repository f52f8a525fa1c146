//! Statistics Report Module
//! Console tables and JSON export for the computed statistics.

use crate::stats::{ColumnMoment, ColumnSummary, CorrelationMatrix, StatsReport};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.3}", v)
    }
}

fn numeric_cell(v: f64) -> Cell {
    Cell::new(fmt_value(v)).set_alignment(CellAlignment::Right)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn build_describe_table(summaries: &[ColumnSummary]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max",
    ]);
    for s in summaries {
        let mut row = Row::new();
        row.add_cell(Cell::new(&s.column));
        row.add_cell(Cell::new(s.count.to_string()).set_alignment(CellAlignment::Right));
        for v in [s.mean, s.std, s.min, s.q25, s.q50, s.q75, s.max] {
            row.add_cell(numeric_cell(v));
        }
        table.add_row(row);
    }
    table
}

/// Skewness and kurtosis side by side, matched by column name.
pub fn build_shape_table(skewness: &[ColumnMoment], kurtosis: &[ColumnMoment]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Column", "Skewness", "Kurtosis"]);
    for skew in skewness {
        let kurt = kurtosis
            .iter()
            .find(|k| k.column == skew.column)
            .map(|k| k.value)
            .unwrap_or(f64::NAN);
        table.add_row(vec![
            Cell::new(&skew.column),
            numeric_cell(skew.value),
            numeric_cell(kurt),
        ]);
    }
    table
}

pub fn build_correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = new_table();
    let mut header = vec![String::new()];
    header.extend(matrix.columns.iter().cloned());
    table.set_header(header);
    for (name, values) in matrix.columns.iter().zip(matrix.values.iter()) {
        let mut row = Row::new();
        row.add_cell(Cell::new(name));
        for &v in values {
            row.add_cell(numeric_cell(v));
        }
        table.add_row(row);
    }
    table
}

/// Print every statistics table to stdout.
pub fn print_summary(report: &StatsReport) {
    println!("Descriptive statistics ({} rows)", report.rows);
    println!("{}", build_describe_table(&report.describe));
    println!("\nSkewness / excess kurtosis");
    println!("{}", build_shape_table(&report.skewness, &report.kurtosis));
    println!("\nCorrelation matrix");
    println!("{}", build_correlation_table(&report.correlation));
}

/// Serialize the report as pretty JSON. Undefined values are written as `null`.
pub fn write_json(report: &StatsReport, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn sample_report() -> StatsReport {
        StatsReport {
            rows: 3,
            describe: vec![ColumnSummary {
                column: "summer_gold".to_string(),
                count: 2,
                mean: 21.5,
                std: 24.748_737_341_529_164,
                min: 4.0,
                q25: 12.75,
                q50: 21.5,
                q75: 30.25,
                max: 39.0,
            }],
            correlation: CorrelationMatrix {
                columns: vec!["summer_gold".to_string(), "flat".to_string()],
                values: vec![vec![1.0, f64::NAN], vec![f64::NAN, f64::NAN]],
            },
            skewness: vec![ColumnMoment {
                column: "summer_gold".to_string(),
                value: 0.0,
            }],
            kurtosis: vec![ColumnMoment {
                column: "summer_gold".to_string(),
                value: f64::NAN,
            }],
        }
    }

    #[test]
    fn test_describe_table_contents() {
        let report = sample_report();
        let rendered = build_describe_table(&report.describe).to_string();
        assert!(rendered.contains("summer_gold"));
        assert!(rendered.contains("21.500"));
        assert!(rendered.contains("24.749"));
    }

    #[test]
    fn test_shape_table_marks_undefined() {
        let report = sample_report();
        let rendered = build_shape_table(&report.skewness, &report.kurtosis).to_string();
        assert!(rendered.contains("0.000"));
        assert!(rendered.contains("NaN"));
    }

    #[test]
    fn test_correlation_table_has_every_column() {
        let report = sample_report();
        let table = build_correlation_table(&report.correlation);
        assert_eq!(table.row_iter().count(), 2);
        assert!(table.to_string().contains("flat"));
    }

    #[test]
    fn test_write_json_nulls_nan() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("stats.json");
        write_json(&sample_report(), &path)?;

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(json["rows"], 3);
        assert_eq!(json["describe"][0]["count"], 2);
        assert!(json["correlation"]["values"][0][1].is_null());
        assert!(json["kurtosis"][0]["value"].is_null());
        Ok(())
    }
}
