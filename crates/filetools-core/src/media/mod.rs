//! Audio and video tools
//!
//! Each tool is a pure builder producing a [`TranscodeJob`]: the files to
//! place in the engine's working directory, the ffmpeg arguments and the
//! name and type of the file to read back. [`MediaRuntime`] executes jobs.

mod audio;
mod engine;
mod video;

pub use audio::*;
pub use engine::{DeviceProfile, EngineConfig, FfmpegEngine, MediaRuntime, TranscodeEngine};
pub use video::*;

#[cfg(test)]
pub(crate) use engine::test_support;

use crate::file::{mime_from_name, InputFile};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Transcoding engine is disabled on this device: {0}")]
    EngineDisabled(String),

    #[error("Failed to load transcoding engine: {0}")]
    EngineLoad(String),

    #[error("Transcoding failed: {0}")]
    ExecFailed(String),

    #[error("Transcoding timed out after {0}s")]
    Timeout(u64),

    #[error("Engine file error: {0}")]
    Io(String),

    #[error("Invalid media option: {0}")]
    InvalidOption(String),

    #[error("No input files")]
    NoInputs,
}

/// A file placed in the engine's working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInput {
    pub name: String,
    pub data: Vec<u8>,
}

impl JobInput {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// One engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub inputs: Vec<JobInput>,
    pub args: Vec<String>,
    pub output: String,
    pub mime: String,
}

impl TranscodeJob {
    /// `-i input.<ext> <filters...> <output>` over a single file
    pub(crate) fn single<I, S>(file: &InputFile, filters: I, output: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let input = input_name(file, None);
        let mut args = vec!["-i".to_string(), input.clone()];
        args.extend(filters.into_iter().map(Into::into));
        args.push(output.to_string());

        Self {
            inputs: vec![JobInput::new(input, file.data.clone())],
            args,
            output: output.to_string(),
            mime: mime_from_name(output),
        }
    }

    /// `-i input0.<ext> -i input1.<ext> ... <filters...> <output>`
    pub(crate) fn multi<I, S>(files: &[InputFile], filters: I, output: &str) -> Result<Self, MediaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if files.is_empty() {
            return Err(MediaError::NoInputs);
        }

        let inputs: Vec<JobInput> = files
            .iter()
            .enumerate()
            .map(|(i, file)| JobInput::new(input_name(file, Some(i)), file.data.clone()))
            .collect();
        let mut args: Vec<String> = inputs
            .iter()
            .flat_map(|input| ["-i".to_string(), input.name.clone()])
            .collect();
        args.extend(filters.into_iter().map(Into::into));
        args.push(output.to_string());

        Ok(Self {
            inputs,
            args,
            output: output.to_string(),
            mime: mime_from_name(output),
        })
    }
}

/// `input.<ext>` or `input<i>.<ext>`, keeping the source extension so the
/// engine can probe the container
fn input_name(file: &InputFile, index: Option<usize>) -> String {
    let extension = file.extension().unwrap_or_else(|| "bin".to_string());
    match index {
        Some(i) => format!("input{}.{}", i, extension),
        None => format!("input.{}", extension),
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> Result<(), MediaError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MediaError::InvalidOption(format!(
            "{} must be greater than 0, got {}",
            name, value
        )))
    }
}

pub(crate) fn require_non_negative(name: &str, value: f64) -> Result<(), MediaError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MediaError::InvalidOption(format!(
            "{} must not be negative, got {}",
            name, value
        )))
    }
}

/// Output format name checked against an allow-list
pub(crate) fn output_format(format: &str, allowed: &[&str]) -> Result<String, MediaError> {
    let format = format.trim().trim_start_matches('.').to_ascii_lowercase();
    if allowed.contains(&format.as_str()) {
        Ok(format)
    } else {
        Err(MediaError::InvalidOption(format!(
            "Unsupported output format '{}'; expected one of {}",
            format,
            allowed.join(", ")
        )))
    }
}
