//! JSON and CSV conversions

use super::{text, DocumentError, CSV_MIME, JSON_MIME, TEXT_MIME};
use crate::file::Blob;
use serde_json::{Map, Value};

fn parse(bytes: &[u8]) -> Result<Value, DocumentError> {
    serde_json::from_str(text(bytes)?).map_err(|e| DocumentError::InvalidJson(e.to_string()))
}

fn render(value: &impl serde::Serialize, pretty: bool) -> Result<String, DocumentError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| DocumentError::InvalidJson(e.to_string()))
}

/// Re-indent with two spaces
pub fn format_json(bytes: &[u8]) -> Result<Blob, DocumentError> {
    Ok(Blob::text(render(&parse(bytes)?, true)?, JSON_MIME))
}

pub fn minify_json(bytes: &[u8]) -> Result<Blob, DocumentError> {
    Ok(Blob::text(render(&parse(bytes)?, false)?, JSON_MIME))
}

/// `Valid JSON` as plain text, or the parser's message as the error
pub fn validate_json(bytes: &[u8]) -> Result<Blob, DocumentError> {
    parse(bytes)?;
    Ok(Blob::text("Valid JSON", TEXT_MIME))
}

/// Flatten an array of objects (or a single object) into CSV.
///
/// The header row is the keys of the first object. Every cell is the
/// JSON encoding of the value, so strings keep their quotes; missing and
/// `null` values become `""`.
pub fn json_to_csv(bytes: &[u8]) -> Result<Blob, DocumentError> {
    let rows = match parse(bytes)? {
        Value::Array(rows) => rows,
        other => vec![other],
    };
    let Some(first) = rows.first() else {
        return Ok(Blob::text("", CSV_MIME));
    };
    let headers: Vec<String> = first
        .as_object()
        .ok_or_else(|| DocumentError::InvalidJson("expected an object or an array of objects".into()))?
        .keys()
        .cloned()
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in &rows {
        let cells = headers
            .iter()
            .map(|header| match row.get(header) {
                None | Some(Value::Null) => Ok("\"\"".to_string()),
                Some(value) => render(value, false),
            })
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(cells.join(","));
    }

    Ok(Blob::text(lines.join("\n"), CSV_MIME))
}

/// Read CSV with a header line into a pretty-printed array of objects.
///
/// Lines are split on bare commas; quoting is not interpreted. Blank lines
/// are skipped and missing trailing cells become empty strings.
pub fn csv_to_json(bytes: &[u8]) -> Result<Blob, DocumentError> {
    let mut lines = text(bytes)?.split('\n').filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Blob::text("[]", JSON_MIME));
    };
    let headers: Vec<&str> = header.split(',').map(str::trim).collect();

    let records: Vec<Value> = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let record: Map<String, Value> = headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let value = values.get(i).copied().unwrap_or_default();
                    (h.to_string(), Value::String(value.to_string()))
                })
                .collect();
            Value::Object(record)
        })
        .collect();

    Ok(Blob::text(render(&records, true)?, JSON_MIME))
}
