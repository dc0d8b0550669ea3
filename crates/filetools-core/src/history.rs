//! Processing history
//!
//! A bounded, newest-first record of completed runs, persisted as JSON.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Records kept before the oldest is dropped
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to access history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("History file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub tool_name: String,
    pub file_size_bytes: u64,
    #[serde(rename = "timestampMs", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    /// A record stamped now (millisecond precision), with a fresh id
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        tool_name: impl Into<String>,
        file_size_bytes: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            tool_name: tool_name.into(),
            file_size_bytes,
            timestamp: Utc::now().trunc_subsecs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    /// Load a log from `path`; a missing file is an empty log
    pub fn load(path: &Path, capacity: usize) -> Result<Self, HistoryError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::with_capacity(capacity)),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let records: Vec<HistoryRecord> =
            serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        if records.len() > capacity {
            warn!(
                "History file holds {} records, keeping the newest {}",
                records.len(),
                capacity
            );
        }

        Ok(Self {
            records: records.into_iter().take(capacity).collect(),
            capacity,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        let io_error = |source| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(&self.records).map_err(|source| {
            HistoryError::Corrupt {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, json).map_err(io_error)
    }

    /// Insert at the front, dropping the oldest record past capacity
    pub fn add(&mut self, record: HistoryRecord) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Remove a record by id, returning whether one was found
    pub fn remove(&mut self, id: &str) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
