//! CLI command definitions and dispatch.

pub mod build;
pub mod config;
pub mod features;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use sitegen_core::SiteConfig;
use sitegen_core::error::AppError;

/// sitegen, an event-driven static site generator
#[derive(Debug, Parser)]
#[command(name = "sitegen", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the site
    Build(build::BuildArgs),
    /// List available and installed features
    Features,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self, config: SiteConfig) -> Result<ExitCode, AppError> {
        match &self.command {
            Commands::Build(args) => build::execute(args, config, self.format),
            Commands::Features => features::execute(&config, self.format).map(|_| ExitCode::SUCCESS),
            Commands::Config(args) => {
                config::execute(args, &config, &self.config, self.format).map(|_| ExitCode::SUCCESS)
            }
        }
    }
}
