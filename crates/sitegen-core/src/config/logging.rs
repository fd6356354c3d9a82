//! Logging configuration.

use serde::{Deserialize, Serialize};

/// The `[logging]` section. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or filter directive, e.g. `"info"` or `"sitegen_engine=debug,warn"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// `"pretty"` for terminals, `"json"` for log collectors.
    #[serde(default = "default_format")]
    pub format: String,
    /// Colored output in the pretty format.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            ansi: default_ansi(),
        }
    }
}

impl LoggingConfig {
    /// Returns whether JSON lines were requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

fn default_ansi() -> bool {
    true
}
