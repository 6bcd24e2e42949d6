//! Export report results to JSON or CSV.

use crate::database::{CellValue, Row};
use crate::error::Result;
use crate::reports::service::ReportRun;
use serde::Deserialize;
use std::io::Write;

/// Supported export formats.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Convert a [`CellValue`] to a display string.
fn cell_value_to_string(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Float(f) => f.to_string(),
        CellValue::Decimal(d) => d.to_string(),
        CellValue::String(s) => s.clone(),
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        CellValue::Json(v) => serde_json::to_string(v).unwrap_or_default(),
    }
}

/// Escape a field value according to RFC 4180.
fn escape_csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Column names for a result set, taken from the first row. Rows are sorted
/// maps, so the order is stable across rows and runs.
fn column_names(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Write a report run as CSV (RFC 4180 with UTF-8 BOM for Excel compatibility).
pub fn write_csv<W: Write>(run: &ReportRun, writer: &mut W) -> Result<()> {
    // UTF-8 BOM for encoding detection
    writer.write_all(&[0xEF, 0xBB, 0xBF])?;

    let columns = column_names(&run.data);
    if columns.is_empty() {
        return Ok(());
    }

    let header: Vec<String> = columns.iter().map(|c| escape_csv_field(c)).collect();
    writer.write_all(header.join(",").as_bytes())?;
    writer.write_all(b"\r\n")?;

    for row in &run.data {
        let fields: Vec<String> = columns
            .iter()
            .map(|column| {
                row.get(column)
                    .map(|v| escape_csv_field(&cell_value_to_string(v)))
                    .unwrap_or_default()
            })
            .collect();
        writer.write_all(fields.join(",").as_bytes())?;
        writer.write_all(b"\r\n")?;
    }

    Ok(())
}

/// Write a report run in the requested format.
pub fn write_run<W: Write>(run: &ReportRun, format: ExportFormat, writer: &mut W) -> Result<()> {
    match format {
        ExportFormat::Json => write_json(run, writer),
        ExportFormat::Csv => write_csv(run, writer),
    }
}

/// Write a report run as JSON with an export metadata envelope.
pub fn write_json<W: Write>(run: &ReportRun, writer: &mut W) -> Result<()> {
    let export = serde_json::json!({
        "metadata": {
            "exported_at": chrono::Utc::now().to_rfc3339(),
            "row_count": run.row_count,
            "format_version": "1.0"
        },
        "data": run.data
    });

    let json_string = serde_json::to_string_pretty(&export)?;
    writer.write_all(json_string.as_bytes())?;

    Ok(())
}
