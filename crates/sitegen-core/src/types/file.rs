//! Discovered source files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Key/value metadata attached to files and render contexts.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A source file found by discovery, before the render loop starts.
///
/// `metadata` is always present; discovery collaborators that know nothing
/// about a file leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    /// Path of the source file.
    pub path: PathBuf,
    /// Site-relative URL the file will be served from.
    pub url: String,
    /// Metadata supplied by discovery.
    #[serde(default)]
    pub metadata: Metadata,
}

impl DiscoveredFile {
    /// Creates a record with empty metadata.
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            metadata: Metadata::new(),
        }
    }

    /// Sets a metadata value.
    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Returns the source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a boolean metadata flag, treating anything else as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
