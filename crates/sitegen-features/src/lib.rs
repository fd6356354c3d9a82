//! Built-in features for sitegen.
//!
//! Each feature is an ordinary [`Feature`](sitegen_plugin::Feature)
//! implementation; nothing here is special-cased by the engine. They are
//! available both as compiled-in features and, through [`builtin_catalog`],
//! as entry points for `feature.toml` manifests.

pub mod catalog;
pub mod drafts;
pub mod passthrough;
pub mod sitemap;
pub mod writer;

pub use catalog::{builtin_catalog, builtin_features};
pub use drafts::Drafts;
pub use passthrough::Passthrough;
pub use sitemap::{SITEMAP_WRITTEN, Sitemap};
pub use writer::Writer;
