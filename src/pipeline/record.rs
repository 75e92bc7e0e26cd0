// src/pipeline/record.rs

//! File records flowing through pipeline stages, and the tool contract.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::config::model::Configuration;
use crate::config::paths::FileSets;
use crate::errors::Result;

/// One file flowing through a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the stream's root (source tree on the way in,
    /// destination tree on the way out).
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Contents as text, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}

/// Configuration passed alongside records to every tool invocation.
pub struct ToolContext<'a> {
    pub config: &'a Configuration,
    pub files: &'a FileSets,
}

/// Contract for a single transform step.
///
/// A tool receives a stream of input records plus configuration and returns
/// the transformed stream. Failures surface as ordinary error values; a
/// tool must not panic on malformed input.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, input: Vec<FileRecord>, ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>>;
}
