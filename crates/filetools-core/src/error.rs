//! Errors at the dispatch boundary

use crate::archive::ArchiveError;
use crate::document::DocumentError;
use crate::image::ImageError;
use crate::media::MediaError;
use crate::options::OptionError;
use crate::pdf::PdfError;
use crate::validation::ValidationError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidOption(#[from] OptionError),

    #[error("Tool \"{0}\" is not implemented yet")]
    NotImplemented(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Processing task failed: {0}")]
    Internal(String),
}

/// A user-facing explanation of a failure with things to try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorHint {
    pub code: &'static str,
    pub message: &'static str,
    pub solutions: &'static [&'static str],
}

pub const FILE_TOO_LARGE: ErrorHint = ErrorHint {
    code: "FILE_TOO_LARGE",
    message: "File size exceeds the limit",
    solutions: &[
        "Try compressing the file first",
        "Split the file into smaller parts",
        "Use a desktop application for large files",
    ],
};

pub const UNSUPPORTED_FORMAT: ErrorHint = ErrorHint {
    code: "UNSUPPORTED_FORMAT",
    message: "File format is not supported",
    solutions: &[
        "Check the supported formats list",
        "Convert the file to a supported format first",
        "Try a different tool",
    ],
};

pub const PROCESSING_FAILED: ErrorHint = ErrorHint {
    code: "PROCESSING_FAILED",
    message: "File processing failed",
    solutions: &[
        "Check if the file is corrupted",
        "Try a different file",
        "Run the tool again",
    ],
};

pub const MEMORY_ERROR: ErrorHint = ErrorHint {
    code: "MEMORY_ERROR",
    message: "Not enough memory to process this file",
    solutions: &[
        "Close other applications",
        "Try processing a smaller file",
        "Use a device with more RAM",
    ],
};

pub const INVALID_FILE: ErrorHint = ErrorHint {
    code: "INVALID_FILE",
    message: "File appears to be corrupted or invalid",
    solutions: &[
        "Try opening the file in its native application",
        "Re-download or re-create the file",
        "Check if the file extension matches the actual format",
    ],
};

impl ToolError {
    pub fn user_hint(&self) -> ErrorHint {
        match self {
            ToolError::Validation(ValidationError::InvalidFile { reason, .. }) => {
                if reason.contains("size") {
                    FILE_TOO_LARGE
                } else {
                    UNSUPPORTED_FORMAT
                }
            }
            ToolError::NotImplemented(_)
            | ToolError::Image(ImageError::UnsupportedFormat(_))
            | ToolError::Document(DocumentError::UnsupportedLanguage(_)) => UNSUPPORTED_FORMAT,
            ToolError::Image(ImageError::Decode)
            | ToolError::Pdf(PdfError::ParseError(_))
            | ToolError::Pdf(PdfError::Unrepairable)
            | ToolError::Document(DocumentError::InvalidJson(_))
            | ToolError::Document(DocumentError::InvalidXml(_))
            | ToolError::Document(DocumentError::InvalidUtf8)
            | ToolError::Archive(ArchiveError::Read(_)) => INVALID_FILE,
            ToolError::Media(MediaError::EngineDisabled(_)) => MEMORY_ERROR,
            _ => PROCESSING_FAILED,
        }
    }
}
