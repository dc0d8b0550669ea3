//! File processing toolkit
//!
//! Validates input files, resolves a tool by name and file category, and
//! runs it locally: image operations with `image`, PDF operations with
//! `lopdf`, document conversions, ZIP archives, and audio/video jobs
//! through an external transcoding engine.
//!
//! ```no_run
//! use filetools_core::{InputFile, Processor, ProcessingRequest};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let file = InputFile::read(Path::new("photo.png"))?;
//! let result = Processor::default()
//!     .process(ProcessingRequest::new("Resize", vec![file]))
//!     .await?;
//! println!("{} bytes", result.total_size());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod file;
pub mod history;
pub mod image;
pub mod media;
pub mod options;
pub mod pdf;
pub mod progress;
pub mod validation;

pub use catalog::{catalog, lookup, tools_for_extension, OptionSpec, ToolCatalogEntry, ToolStatus};
pub use config::Config;
pub use dispatch::{ProcessingRequest, ProcessingResult, Processor, Tool};
pub use error::{ErrorHint, ToolError};
pub use file::{Blob, FileCategory, InputFile};
pub use history::{HistoryLog, HistoryRecord};
pub use options::{OptionError, ToolOptions};
pub use progress::ProgressSink;
pub use validation::{validate_file, SizeLimits, ValidationResult, ValidationRules};
