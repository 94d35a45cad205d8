use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::ConnectionRecord;

pub const CSV_HEADER: &str = "First Name,Last Name,Email,LinkedIn URL,Phone,Title";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown export format {0:?} (expected CSV or JSON)")]
pub struct ParseFormatError(String);

impl FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("csv") => Ok(ExportFormat::Csv),
            v if v.eq_ignore_ascii_case("json") => Ok(ExportFormat::Json),
            other => Err(ParseFormatError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A rendered export, ready to be handed to whatever persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub format: ExportFormat,
    pub body: String,
}

pub fn serialize(records: &[ConnectionRecord], format: ExportFormat) -> Result<String, SerializeError> {
    match format {
        ExportFormat::Csv => Ok(to_csv(records)),
        ExportFormat::Json => to_json(records),
    }
}

/// Header line plus one line per record, joined by `\n` with no trailing newline.
///
/// Name and title fields containing a comma are wrapped in double quotes as-is;
/// embedded double quotes are not escaped. Phones are always quoted, and an
/// absent phone list renders as `"null"`.
pub fn to_csv(records: &[ConnectionRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for record in records {
        lines.push(
            [
                quote_if_comma(&record.first_name),
                quote_if_comma(&record.last_name),
                Cow::Borrowed(record.email.as_str()),
                Cow::Borrowed(record.profile_url.as_str()),
                Cow::Owned(phone_field(record.phones.as_deref())),
                quote_if_comma(&record.title),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

pub fn to_json(records: &[ConnectionRecord]) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn quote_if_comma(value: &str) -> Cow<'_, str> {
    if value.contains(',') {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

fn phone_field(phones: Option<&[String]>) -> String {
    match phones {
        Some(numbers) => format!("\"{}\"", numbers.join(",")),
        None => "\"null\"".to_string(),
    }
}
