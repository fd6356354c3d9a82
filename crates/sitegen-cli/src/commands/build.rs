//! Site build command.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use sitegen_core::SiteConfig;
use sitegen_core::error::AppError;
use sitegen_engine::{GenerationReport, Generator, RunOutcome, SkipReason};
use sitegen_features::{builtin_catalog, builtin_features};

/// Exit code for a failed run.
const EXIT_FAILED: u8 = 1;
/// Exit code for a degraded run under `--strict`.
const EXIT_DEGRADED: u8 = 2;

/// Arguments for the build command
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Override `paths.source_dir`
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Override `paths.output_dir`
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Override `paths.plugin_dir`
    #[arg(long)]
    pub plugins: Option<PathBuf>,
    /// Exit non-zero when any feature, event, or file failed
    #[arg(long)]
    pub strict: bool,
    /// Only run features from the feature directory
    #[arg(long)]
    pub no_builtins: bool,
}

/// One problem reported by the run.
#[derive(Debug, Serialize, Tabled)]
struct ProblemRow {
    /// Where it happened
    stage: String,
    /// Feature or file concerned
    subject: String,
    /// What went wrong
    message: String,
}

/// Execute the build command
pub fn execute(
    args: &BuildArgs,
    mut config: SiteConfig,
    format: OutputFormat,
) -> Result<ExitCode, AppError> {
    if let Some(source) = &args.source {
        config.paths.source_dir = source.clone();
    }
    if let Some(out) = &args.output {
        config.paths.output_dir = out.clone();
    }
    if let Some(plugins) = &args.plugins {
        config.paths.plugin_dir = plugins.clone();
    }
    config.validate()?;

    let mut generator = Generator::from_config(config, builtin_catalog());
    if !args.no_builtins {
        for feature in builtin_features() {
            generator = generator.with_feature(feature);
        }
    }

    let report = generator.generate();
    print_report(&report, format);

    Ok(ExitCode::from(exit_code(&report, args.strict)))
}

fn exit_code(report: &GenerationReport, strict: bool) -> u8 {
    match report.outcome {
        RunOutcome::Failed => EXIT_FAILED,
        RunOutcome::Degraded if strict => EXIT_DEGRADED,
        _ => 0,
    }
}

fn print_report(report: &GenerationReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_item(report, format);
        return;
    }

    output::print_kv("Run", &report.run_id.to_string());
    output::print_kv("Outcome", &report.outcome.to_string());
    output::print_kv("Features", &report.plugins_loaded.join(", "));
    output::print_kv("Discovered", &report.files_discovered.to_string());
    output::print_kv("Rendered", &report.render_loop.rendered.to_string());
    output::print_kv("Unrendered", &report.render_loop.unrendered.to_string());
    output::print_kv("Skipped", &report.render_loop.skipped.len().to_string());
    if let Some(finished) = report.finished_at {
        let elapsed = finished - report.started_at;
        output::print_kv("Duration", &format!("{} ms", elapsed.num_milliseconds()));
    }

    let problems = problems(report);
    if !problems.is_empty() {
        println!();
        output::print_list(&problems, format);
    }

    match report.outcome {
        RunOutcome::Clean => output::print_success("Site generated"),
        RunOutcome::Degraded => output::print_warning("Site generated with problems"),
        RunOutcome::Failed => output::print_error("Site generation failed"),
    }
}

fn problems(report: &GenerationReport) -> Vec<ProblemRow> {
    let mut rows = Vec::new();

    if let Some(fatal) = &report.fatal {
        rows.push(ProblemRow {
            stage: "generator".to_string(),
            subject: "-".to_string(),
            message: fatal.clone(),
        });
    }
    for failure in &report.plugin_failures {
        rows.push(ProblemRow {
            stage: "load".to_string(),
            subject: failure.plugin.clone(),
            message: failure.reason.clone(),
        });
    }
    if let Some(error) = &report.discovery_error {
        rows.push(ProblemRow {
            stage: "discovery".to_string(),
            subject: "-".to_string(),
            message: error.clone(),
        });
    }
    if report.files_rejected > 0 {
        rows.push(ProblemRow {
            stage: "discovery".to_string(),
            subject: "-".to_string(),
            message: format!("{} discovered entries had no path", report.files_rejected),
        });
    }
    for failure in &report.event_failures {
        rows.push(ProblemRow {
            stage: failure.event.clone(),
            subject: failure.plugin_id.clone(),
            message: failure.message.clone(),
        });
    }
    for failure in &report.render_loop.failures {
        rows.push(ProblemRow {
            stage: failure.stage.clone(),
            subject: failure.path.display().to_string(),
            message: format!("{}: {}", failure.plugin_id, failure.message),
        });
    }
    for skipped in &report.render_loop.skipped {
        if let SkipReason::Collision {
            output_path,
            claimed_by,
        } = &skipped.reason
        {
            rows.push(ProblemRow {
                stage: "collision".to_string(),
                subject: skipped.path.display().to_string(),
                message: format!(
                    "'{}' already written by '{}'",
                    output_path.display(),
                    claimed_by.display()
                ),
            });
        }
    }

    rows
}
