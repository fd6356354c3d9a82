//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use sitegen_core::SiteConfig;
use sitegen_core::error::AppError;

/// Annotated default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../../config/default.toml");

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Write the default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "sitegen.toml")]
        output: String,
    },
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &SiteConfig,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => output::print_item(config, format),
        ConfigCommand::Validate => {
            config.validate()?;
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            output::print_kv("Site", &config.site.title);
            output::print_kv("Base URL", &config.site.base_url);
            output::print_kv("Source", &config.paths.source_dir.display().to_string());
            output::print_kv("Output", &config.paths.output_dir.display().to_string());
            output::print_kv("Features", &config.paths.plugin_dir.display().to_string());
        }
        ConfigCommand::Generate { output: out_path } => {
            let path = std::path::Path::new(out_path);
            if path.exists() {
                return Err(AppError::conflict(format!("'{out_path}' already exists")));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, DEFAULT_CONFIG)?;
            output::print_success(&format!("Default config written to '{out_path}'"));
        }
    }

    Ok(())
}
