//! Tool options
//!
//! Options arrive as a map of option id to JSON primitive. Getters apply the
//! tool's default when an option is absent and fail when it has the wrong type.

use crate::pdf::PageSelection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid option '{option}': expected {expected}")]
pub struct OptionError {
    pub option: String,
    pub expected: String,
}

impl OptionError {
    pub fn new(option: &str, expected: impl Into<String>) -> Self {
        Self {
            option: option.to_string(),
            expected: expected.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolOptions(Map<String, Value>);

impl ToolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Parse a `key=value` pair; the value is read as JSON when possible
    pub fn set_from_pair(&mut self, pair: &str) -> Result<(), OptionError> {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| OptionError::new(pair, "key=value"))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.set(key.trim(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, OptionError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => as_f64(value).ok_or_else(|| OptionError::new(key, "a number")),
        }
    }

    pub fn i64_or(&self, key: &str, default: i64) -> Result<i64, OptionError> {
        let value = self.f64_or(key, default as f64)?;
        if value.fract() != 0.0 {
            return Err(OptionError::new(key, "a whole number"));
        }
        Ok(value as i64)
    }

    pub fn u32_or(&self, key: &str, default: u32) -> Result<u32, OptionError> {
        let value = self.i64_or(key, default as i64)?;
        u32::try_from(value).map_err(|_| OptionError::new(key, "a non-negative whole number"))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, OptionError> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
            Some(_) => Err(OptionError::new(key, "true or false")),
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> Result<String, OptionError> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(OptionError::new(key, "a string")),
        }
    }

    /// Quality factor in `(0, 1]`; values above 1 are read as percentages
    pub fn quality_or(&self, key: &str, default: f32) -> Result<f32, OptionError> {
        let raw = self.f64_or(key, default as f64)?;
        let quality = if raw > 1.0 { raw / 100.0 } else { raw };
        if quality <= 0.0 || quality > 1.0 {
            return Err(OptionError::new(key, "a quality between 0 and 1 (or 1-100)"));
        }
        Ok(quality as f32)
    }

    /// Pages to act on.
    ///
    /// Accepts a JSON array of zero-based indices or a 1-based range string
    /// such as `"1-3, 5"`, resolved later against the document.
    pub fn indices_or(&self, key: &str, default: &[usize]) -> Result<PageSelection, OptionError> {
        match self.get(key) {
            None => Ok(PageSelection::Indices(default.to_vec())),
            Some(value) => as_selection(value).ok_or_else(|| {
                OptionError::new(key, "an array of page indices or a range like \"1-3, 5\"")
            }),
        }
    }

    /// Groups of pages, one per output.
    ///
    /// Accepts a JSON array of index arrays or 1-based ranges separated by
    /// `;` (e.g. `"1-2; 3-5"`).
    pub fn ranges_or(
        &self,
        key: &str,
        default: &[Vec<usize>],
    ) -> Result<Vec<PageSelection>, OptionError> {
        let expected = "an array of page index arrays or ranges like \"1-2; 3-5\"";
        match self.get(key) {
            None => Ok(default.iter().cloned().map(PageSelection::Indices).collect()),
            Some(Value::Array(groups)) => groups
                .iter()
                .map(|g| as_selection(g).ok_or_else(|| OptionError::new(key, expected)))
                .collect(),
            Some(Value::String(s)) => Ok(s
                .split(';')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(|g| PageSelection::Ranges(g.to_string()))
                .collect()),
            Some(_) => Err(OptionError::new(key, expected)),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches(['x', '%'])
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}

fn as_selection(value: &Value) -> Option<PageSelection> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|n| usize::try_from(n).ok()))
            .collect::<Option<Vec<_>>>()
            .map(PageSelection::Indices),
        Value::String(s) => Some(PageSelection::Ranges(s.trim().to_string())),
        _ => None,
    }
}
