//! Output mapping configuration.

use serde::{Deserialize, Serialize};

/// The `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Extension given to rendered pages (without the dot).
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Source extensions that are rewritten to `output_extension`.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_extension: default_output_extension(),
            source_extensions: default_source_extensions(),
        }
    }
}

impl RenderConfig {
    /// Returns whether `ext` is a known source extension (case-insensitive).
    pub fn is_source_extension(&self, ext: &str) -> bool {
        self.source_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

fn default_output_extension() -> String {
    "html".to_string()
}

fn default_source_extensions() -> Vec<String> {
    ["md", "markdown", "html", "htm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
