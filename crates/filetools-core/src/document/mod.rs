//! Text document tools
//!
//! JSON and XML go through real parsers (`serde_json`, `quick-xml`). CSV and
//! the CSS, HTML and JavaScript formatters are plain text rewrites: they do
//! not understand quoting or string literals, so unusual input can come out
//! mangled.

mod code;
mod json;
mod xml;

pub use code::{format_code, minify_code, CodeLanguage};
pub use json::{csv_to_json, format_json, json_to_csv, minify_json, validate_json};
pub use xml::{format_xml, validate_xml};

use thiserror::Error;

pub const JSON_MIME: &str = "application/json";
pub const CSV_MIME: &str = "text/csv";
pub const XML_MIME: &str = "application/xml";
pub const TEXT_MIME: &str = "text/plain";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    #[error("File is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("Unsupported code language: {0}")]
    UnsupportedLanguage(String),
}

/// Decode UTF-8 text, dropping a leading byte order mark
pub(crate) fn text(bytes: &[u8]) -> Result<&str, DocumentError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DocumentError::InvalidUtf8)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}
