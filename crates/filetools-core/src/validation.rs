//! File validation
//!
//! Checks size, declared type, extension and count before any adapter runs.
//! Validation has no side effects; callers surface the message and abort.

use crate::file::{FileCategory, InputFile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MB: u64 = 1024 * 1024;

/// Files above this size pass validation with a warning
pub const LARGE_FILE_WARNING_BYTES: u64 = 100 * MB;

/// Default maximum number of files for multi-file tools
pub const DEFAULT_MAX_FILES: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No files provided")]
    NoFiles,

    #[error("{file}: {reason}")]
    InvalidFile { file: String, reason: String },

    #[error("Maximum {max} files allowed")]
    TooManyFiles { max: usize, actual: usize },
}

/// Per-category size ceilings in bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    #[serde(default = "default_image_limit")]
    pub image: u64,
    #[serde(default = "default_pdf_limit")]
    pub pdf: u64,
    #[serde(default = "default_video_limit")]
    pub video: u64,
    #[serde(default = "default_audio_limit")]
    pub audio: u64,
    #[serde(default = "default_fallback_limit")]
    pub default: u64,
}

fn default_image_limit() -> u64 {
    50 * MB
}

fn default_pdf_limit() -> u64 {
    100 * MB
}

fn default_video_limit() -> u64 {
    500 * MB
}

fn default_audio_limit() -> u64 {
    100 * MB
}

fn default_fallback_limit() -> u64 {
    100 * MB
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            image: default_image_limit(),
            pdf: default_pdf_limit(),
            video: default_video_limit(),
            audio: default_audio_limit(),
            default: default_fallback_limit(),
        }
    }
}

impl SizeLimits {
    /// Ceiling for a category.
    ///
    /// Text-like documents fall under the default ceiling: only image, PDF,
    /// video and audio types are sniffed for a dedicated limit.
    pub fn limit_for(&self, category: FileCategory) -> u64 {
        match category {
            FileCategory::Image => self.image,
            FileCategory::Pdf => self.pdf,
            FileCategory::Video => self.video,
            FileCategory::Audio => self.audio,
            FileCategory::Document | FileCategory::Other => self.default,
        }
    }
}

/// Rule set applied to a single file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub max_size_bytes: Option<u64>,
    pub min_size_bytes: Option<u64>,
    /// MIME types; `type/*` matches any subtype
    #[serde(default)]
    pub allowed_types: Vec<String>,
    /// Lowercase extensions without the dot
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl ValidationRules {
    /// Rules carrying only the size ceiling for the file's category
    pub fn for_file(file: &InputFile, limits: &SizeLimits) -> Self {
        Self {
            max_size_bytes: Some(limits.limit_for(file.category())),
            ..Self::default()
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of validating one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn ok(warnings: Vec<String>) -> Self {
        Self {
            valid: true,
            error: None,
            warnings,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            warnings: Vec::new(),
        }
    }
}

/// Validate a file against a rule set
pub fn validate_file(file: &InputFile, rules: &ValidationRules) -> ValidationResult {
    let size = file.size();

    if let Some(max) = rules.max_size_bytes {
        if size > max {
            return ValidationResult::fail(format!(
                "File size exceeds {} limit",
                format_file_size(max)
            ));
        }
    }

    if let Some(min) = rules.min_size_bytes {
        if size < min {
            return ValidationResult::fail(format!(
                "File size is too small. Minimum size is {}",
                format_file_size(min)
            ));
        }
    }

    if !rules.allowed_types.is_empty() && !type_allowed(&file.mime, &rules.allowed_types) {
        return ValidationResult::fail(format!(
            "File type \"{}\" is not supported. Allowed types: {}",
            file.mime,
            rules.allowed_types.join(", ")
        ));
    }

    if !rules.allowed_extensions.is_empty() {
        let extension = file.extension();
        let allowed = extension
            .as_deref()
            .map(|ext| rules.allowed_extensions.iter().any(|a| a == ext))
            .unwrap_or(false);
        if !allowed {
            return ValidationResult::fail(format!(
                "File type .{} is not supported. Allowed: {}",
                extension.unwrap_or_default(),
                rules.allowed_extensions.join(", ")
            ));
        }
    }

    let mut warnings = Vec::new();
    if size > LARGE_FILE_WARNING_BYTES {
        warnings.push("Large file detected. Processing may take longer.".to_string());
    }

    ValidationResult::ok(warnings)
}

/// Validate every file against the same rule set
pub fn validate_files(files: &[InputFile], rules: &ValidationRules) -> Vec<ValidationResult> {
    files.iter().map(|f| validate_file(f, rules)).collect()
}

/// Check the file count of a multi-file request
pub fn validate_file_count(count: usize, max: usize) -> ValidationResult {
    if count > max {
        ValidationResult::fail(format!("Maximum {} files allowed", max))
    } else {
        ValidationResult::ok(Vec::new())
    }
}

/// Validate a whole request: non-empty, each file within its category ceiling
pub fn validate_request(
    files: &[InputFile],
    limits: &SizeLimits,
) -> Result<Vec<String>, ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    let mut warnings = Vec::new();
    for file in files {
        let result = validate_file(file, &ValidationRules::for_file(file, limits));
        if !result.valid {
            return Err(ValidationError::InvalidFile {
                file: file.name.clone(),
                reason: result
                    .error
                    .unwrap_or_else(|| "File validation failed".to_string()),
            });
        }
        warnings.extend(
            result
                .warnings
                .into_iter()
                .map(|w| format!("{}: {}", file.name, w)),
        );
    }

    Ok(warnings)
}

fn type_allowed(mime: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|t| match t.strip_suffix("/*") {
        Some(prefix) => mime
            .split_once('/')
            .map(|(major, _)| major == prefix)
            .unwrap_or(false),
        None => mime == t,
    })
}

/// Format bytes as a human-readable size
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}
