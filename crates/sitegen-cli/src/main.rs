//! sitegen CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use sitegen_core::SiteConfig;

mod commands;
mod output;

use commands::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SiteConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration '{}': {}", cli.config, e));
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);

    match cli.execute(config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            output::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing from `[logging]`; `RUST_LOG` takes precedence.
fn init_logging(config: &SiteConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(config.logging.ansi)
            .with_writer(std::io::stderr)
            .init();
    }
}
