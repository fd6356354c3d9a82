//! Feature catalog: resolves manifest entry points to constructors.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::FeatureError;
use crate::feature::Feature;
use crate::manifest::FeatureManifest;

/// Builds a feature instance from its manifest.
pub type FeatureFactory =
    Arc<dyn Fn(&FeatureManifest) -> Result<Arc<dyn Feature>, FeatureError> + Send + Sync>;

/// Entry name → factory.
#[derive(Clone, Default)]
pub struct FeatureCatalog {
    /// Known factories, sorted by entry name.
    factories: BTreeMap<String, FeatureFactory>,
}

impl std::fmt::Debug for FeatureCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureCatalog")
            .field("entries", &self.entries())
            .finish()
    }
}

impl FeatureCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a factory.
    pub fn register<F>(&mut self, entry: &str, factory: F) -> &mut Self
    where
        F: Fn(&FeatureManifest) -> Result<Arc<dyn Feature>, FeatureError> + Send + Sync + 'static,
    {
        self.factories.insert(entry.to_string(), Arc::new(factory));
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with<F>(mut self, entry: &str, factory: F) -> Self
    where
        F: Fn(&FeatureManifest) -> Result<Arc<dyn Feature>, FeatureError> + Send + Sync + 'static,
    {
        self.register(entry, factory);
        self
    }

    /// Builds the feature a manifest points at.
    pub fn resolve(&self, manifest: &FeatureManifest) -> Result<Arc<dyn Feature>, FeatureError> {
        let factory = self
            .factories
            .get(&manifest.entry)
            .ok_or_else(|| FeatureError::UnknownEntry(manifest.entry.clone()))?;
        factory(manifest)
    }

    /// Returns whether an entry is known.
    pub fn contains(&self, entry: &str) -> bool {
        self.factories.contains_key(entry)
    }

    /// Known entry names, sorted.
    pub fn entries(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
