//! # sitegen-engine
//!
//! The generation pipeline. The [`Generator`] boots features, fires the
//! whole-run lifecycle events, asks a [`Discovery`] collaborator for the
//! content files, and hands them to the [`RenderLoop`], which threads a
//! fresh render context through the per-file events of each file.
//!
//! Failures of features, lifecycle events, discovery, and individual files
//! are isolated and counted in the [`GenerationReport`]; only a fault in the
//! generator's own bookkeeping fails the run.

pub mod discovery;
pub mod generator;
pub mod render_loop;
pub mod report;

pub use discovery::{Discovery, FsDiscovery, StaticDiscovery};
pub use generator::Generator;
pub use render_loop::RenderLoop;
pub use report::{
    EventFailure, FileFailure, GenerationReport, LoopReport, RunOutcome, SkipReason, SkippedFile,
};
