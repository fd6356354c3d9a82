//! # sitegen-core
//!
//! Core crate for sitegen. Contains the configuration schemas, the records
//! threaded through the generation pipeline (discovered files and the
//! per-file render context), output path mapping, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other sitegen crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use config::SiteConfig;
pub use error::AppError;
pub use result::AppResult;
pub use types::{DiscoveredFile, Metadata, RenderContext};
