//! CSV and JSON export of resource collections.
//!
//! CSV output targets spreadsheet tools: a UTF-8 byte-order mark so
//! non-ASCII text opens correctly, every field quoted, embedded quotes
//! doubled, CRLF line endings.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use time::Date;

use crate::error::PortalError;
use crate::record::{Record, value_text};

pub const UTF8_BOM: &str = "\u{feff}";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A finished export, ready for the host to save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `(field, header)` pairs; when empty, the union of record keys is used.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportColumns(pub Vec<(&'static str, &'static str)>);

impl ExportColumns {
    /// Resolve to `(field, header)` for `records`. Without explicit columns,
    /// every key in first-seen order, with the key as its own header.
    #[must_use]
    pub fn resolve(&self, records: &[Record]) -> Vec<(String, String)> {
        if !self.0.is_empty() {
            return self
                .0
                .iter()
                .map(|(field, header)| ((*field).to_owned(), (*header).to_owned()))
                .collect();
        }
        let mut keys: Vec<String> = Vec::new();
        for record in records {
            for (key, _) in record.fields() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys.into_iter().map(|k| (k.clone(), k)).collect()
    }
}

#[must_use]
pub fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[must_use]
pub fn to_csv(records: &[Record], columns: &ExportColumns) -> String {
    let columns = columns.resolve(records);
    let mut out = String::from(UTF8_BOM);

    let header: Vec<String> = columns.iter().map(|(_, header)| csv_field(header)).collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");

    for record in records {
        let line: Vec<String> = columns
            .iter()
            .map(|(field, _)| csv_field(&value_text(record.get(field))))
            .collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Pretty-printed JSON array of the records as received.
///
/// # Errors
///
/// Returns [`PortalError::Decode`] if serialization fails.
pub fn to_json(records: &[Record]) -> Result<String, PortalError> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[must_use]
pub fn export_filename(resource_key: &str, format: ExportFormat, date: Date) -> String {
    format!("{resource_key}_{date}.{}", format.extension())
}

/// Serialize `records` into a named file for `date`.
///
/// # Errors
///
/// Returns [`PortalError::Decode`] if JSON serialization fails.
pub fn build_export(
    resource_key: &str,
    records: &[Record],
    columns: &ExportColumns,
    format: ExportFormat,
    date: Date,
) -> Result<ExportFile, PortalError> {
    let body = match format {
        ExportFormat::Csv => to_csv(records, columns),
        ExportFormat::Json => to_json(records)?,
    };
    Ok(ExportFile { filename: export_filename(resource_key, format, date), mime: format.mime(), bytes: body.into_bytes() })
}
