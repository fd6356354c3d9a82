//! Catalog of the built-in features.

use std::sync::Arc;

use sitegen_plugin::{Feature, FeatureCatalog};

use crate::drafts::Drafts;
use crate::passthrough::Passthrough;
use crate::sitemap::Sitemap;
use crate::writer::Writer;

/// A catalog resolving the built-in entry points, for `feature.toml`
/// manifests.
pub fn builtin_catalog() -> FeatureCatalog {
    FeatureCatalog::new()
        .with(Drafts::ENTRY, |m| Ok(Arc::new(Drafts::from_manifest(m)) as Arc<dyn Feature>))
        .with(Passthrough::ENTRY, |m| {
            Ok(Arc::new(Passthrough::from_manifest(m)) as Arc<dyn Feature>)
        })
        .with(Writer::ENTRY, |m| Ok(Arc::new(Writer::new(&m.name)) as Arc<dyn Feature>))
        .with(Sitemap::ENTRY, |m| Ok(Arc::new(Sitemap::from_manifest(m)) as Arc<dyn Feature>))
}

/// The built-in features with default names and options.
pub fn builtin_features() -> Vec<Arc<dyn Feature>> {
    vec![
        Arc::new(Drafts::new(Drafts::ENTRY)),
        Arc::new(Passthrough::new(Passthrough::ENTRY)),
        Arc::new(Writer::new(Writer::ENTRY)),
        Arc::new(Sitemap::new(Sitemap::ENTRY)),
    ]
}
