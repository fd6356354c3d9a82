//! Directory layout configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the content tree.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Root the rendered site is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory scanned for feature subdirectories.
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            plugin_dir: default_plugin_dir(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_plugin_dir() -> PathBuf {
    PathBuf::from("features")
}
