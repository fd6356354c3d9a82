//! Structured run reports.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sitegen_plugin::LoadFailure;

/// Plugin id reported when no feature can be blamed for a bad payload.
pub const UNKNOWN_PLUGIN: &str = "unknown";

/// Why a file left the render loop early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Another source file already claimed the output path.
    Collision {
        /// The output path both files map to.
        output_path: PathBuf,
        /// The source file that claimed it first.
        claimed_by: PathBuf,
    },
    /// A listener set `skip_file`.
    Deferred {
        /// Event after which the file was skipped.
        stage: String,
    },
}

/// A file that was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Source file.
    pub path: PathBuf,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A file whose per-file events failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Source file.
    pub path: PathBuf,
    /// Event that failed.
    pub stage: String,
    /// Feature whose listener failed.
    pub plugin_id: String,
    /// Error message.
    pub message: String,
}

/// A whole-run lifecycle event whose listeners failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFailure {
    /// Event that failed.
    pub event: String,
    /// Feature whose listener failed.
    pub plugin_id: String,
    /// Error message.
    pub message: String,
}

/// Outcome of one pass of the render loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopReport {
    /// Files that went through every per-file event.
    pub processed: usize,
    /// Processed files that ended up with rendered content.
    pub rendered: usize,
    /// Processed files nobody rendered.
    pub unrendered: usize,
    /// Files skipped by collision or by a listener.
    pub skipped: Vec<SkippedFile>,
    /// Files whose events failed.
    pub failures: Vec<FileFailure>,
}

impl LoopReport {
    /// Files skipped because their output path was taken.
    pub fn collisions(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Collision { .. }))
            .count()
    }
}

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing failed.
    Clean,
    /// The run completed, with isolated failures.
    Degraded,
    /// The generator itself failed.
    Failed,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Degraded => write!(f, "degraded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Everything that happened during one `generate()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: Option<DateTime<Utc>>,
    /// Overall verdict.
    pub outcome: RunOutcome,
    /// Features loaded, in load order.
    pub plugins_loaded: Vec<String>,
    /// Features disabled by their manifest.
    pub plugins_disabled: Vec<String>,
    /// Features that failed to load.
    pub plugin_failures: Vec<LoadFailure>,
    /// Lifecycle events whose listeners failed.
    pub event_failures: Vec<EventFailure>,
    /// Discovery failure, if discovery failed.
    pub discovery_error: Option<String>,
    /// Number of files discovery returned.
    pub files_discovered: usize,
    /// Discovered entries dropped because they had no path.
    pub files_rejected: usize,
    /// Render loop results.
    #[serde(rename = "loop")]
    pub render_loop: LoopReport,
    /// Fault in the generator itself.
    pub fatal: Option<String>,
}

impl GenerationReport {
    /// Starts a report for a new run.
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: RunOutcome::Clean,
            plugins_loaded: Vec::new(),
            plugins_disabled: Vec::new(),
            plugin_failures: Vec::new(),
            event_failures: Vec::new(),
            discovery_error: None,
            files_discovered: 0,
            files_rejected: 0,
            render_loop: LoopReport::default(),
            fatal: None,
        }
    }

    /// Number of isolated failures of any kind.
    pub fn isolated_failures(&self) -> usize {
        self.plugin_failures.len()
            + self.event_failures.len()
            + self.render_loop.failures.len()
            + usize::from(self.discovery_error.is_some())
            + self.files_rejected
    }

    /// Closes the report and derives the outcome.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.outcome = if self.fatal.is_some() {
            RunOutcome::Failed
        } else if self.isolated_failures() > 0 || self.render_loop.collisions() > 0 {
            RunOutcome::Degraded
        } else {
            RunOutcome::Clean
        };
    }

    /// False only when the generator itself failed.
    pub fn success(&self) -> bool {
        self.outcome != RunOutcome::Failed
    }

    /// True when nothing failed and nothing collided.
    pub fn is_clean(&self) -> bool {
        self.outcome == RunOutcome::Clean
    }
}
