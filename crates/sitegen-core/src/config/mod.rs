//! Site configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from an
//! optional TOML file overlaid with `SITEGEN__`-prefixed environment
//! variables. Each sub-module represents a logical configuration section.

pub mod logging;
pub mod paths;
pub mod render;
pub mod site;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::paths::PathsConfig;
pub use self::render::RenderConfig;
pub use self::site::SiteSection;

use crate::error::AppError;

/// Root configuration for one site generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site identity (title, base URL).
    #[serde(default)]
    pub site: SiteSection,
    /// Source, output, and feature directories.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Output path mapping settings.
    #[serde(default)]
    pub render: RenderConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SiteConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; every field has a default. Environment
    /// variables such as `SITEGEN__PATHS__OUTPUT_DIR` override file values.
    /// Values are not checked here; see [`validate`](Self::validate).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SITEGEN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("render.source_extensions")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let site: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        tracing::debug!(
            path = %path,
            source_dir = %site.paths.source_dir.display(),
            output_dir = %site.paths.output_dir.display(),
            "Configuration loaded"
        );
        Ok(site)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.render.output_extension.trim().is_empty() {
            return Err(AppError::validation("render.output_extension must not be empty"));
        }
        if self.render.output_extension.starts_with('.') {
            return Err(AppError::validation(
                "render.output_extension must not start with a dot",
            ));
        }
        if self.paths.source_dir == self.paths.output_dir {
            return Err(AppError::validation(format!(
                "paths.source_dir and paths.output_dir are both '{}'",
                self.paths.source_dir.display()
            )));
        }
        Ok(())
    }
}
