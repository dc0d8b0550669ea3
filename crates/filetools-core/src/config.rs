//! TOML configuration
//!
//! Every section is optional; an empty file yields the built-in defaults.
//!
//! ```toml
//! max_files = 10
//! history_path = "/var/lib/filetools/history.json"
//!
//! [limits]
//! video = 1073741824
//!
//! [media]
//! ffmpeg_path = "/usr/local/bin/ffmpeg"
//! exec_timeout_secs = 600
//! ```

use crate::dispatch::Processor;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::media::{EngineConfig, MediaRuntime};
use crate::validation::{SizeLimits, DEFAULT_MAX_FILES};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Per-category size ceilings
    #[serde(default)]
    pub limits: SizeLimits,

    /// Most files accepted by a multi-file tool
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default)]
    pub media: EngineConfig,
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_history_path() -> PathBuf {
    PathBuf::from("filetools-history.json")
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: SizeLimits::default(),
            max_files: default_max_files(),
            history_path: default_history_path(),
            history_capacity: default_history_capacity(),
            media: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// A processor using these limits and engine settings
    pub fn processor(&self) -> Processor {
        Processor::new(
            self.limits.clone(),
            self.max_files,
            MediaRuntime::new(self.media.clone()),
        )
    }
}
