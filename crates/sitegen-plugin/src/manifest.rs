//! Feature manifests, the entry point of a feature directory.
//!
//! ```toml
//! name = "sitemap"
//! entry = "sitemap"
//! description = "Writes sitemap.xml"
//!
//! [options]
//! file = "sitemap.xml"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeatureError;

/// File name looked up in every feature directory.
pub const MANIFEST_FILE: &str = "feature.toml";

/// Parsed `feature.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureManifest {
    /// Feature name, unique per run.
    pub name: String,
    /// Catalog entry that builds the feature.
    pub entry: String,
    /// Disabled features are skipped at load time.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Free-form options handed to the factory.
    #[serde(default)]
    pub options: serde_json::Map<String, Value>,
    /// Directory the manifest was loaded from.
    #[serde(skip)]
    pub directory: PathBuf,
}

impl FeatureManifest {
    /// Creates an in-memory manifest for a compiled-in feature.
    pub fn inline(name: &str, entry: &str) -> Self {
        Self {
            name: name.to_string(),
            entry: entry.to_string(),
            enabled: true,
            description: String::new(),
            options: serde_json::Map::new(),
            directory: PathBuf::new(),
        }
    }

    /// Sets an option value.
    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    /// Loads the manifest of a feature directory.
    pub fn load(directory: &Path) -> Result<Self, FeatureError> {
        let path = directory.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(FeatureError::MissingEntryPoint(directory.to_path_buf()));
        }

        let invalid = |message: String| FeatureError::Manifest {
            path: path.clone(),
            message,
        };

        let mut manifest: Self = config::Config::builder()
            .add_source(config::File::from(path.as_path()).format(config::FileFormat::Toml))
            .build()
            .map_err(|e| invalid(e.to_string()))?
            .try_deserialize()
            .map_err(|e| invalid(e.to_string()))?;

        if manifest.name.trim().is_empty() {
            return Err(invalid("'name' must not be empty".to_string()));
        }
        if manifest.entry.trim().is_empty() {
            return Err(invalid("'entry' must not be empty".to_string()));
        }

        manifest.directory = directory.to_path_buf();
        Ok(manifest)
    }

    /// Reads a string option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Reads an integer option.
    pub fn option_i64(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_i64())
    }

    /// Reads a list-of-strings option; non-string items are ignored.
    pub fn option_list(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn default_true() -> bool {
    true
}
