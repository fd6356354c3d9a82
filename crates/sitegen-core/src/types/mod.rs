//! Records threaded through the generation pipeline.

pub mod context;
pub mod file;
pub mod output;

pub use context::RenderContext;
pub use file::{DiscoveredFile, Metadata};
pub use output::OutputMapper;
