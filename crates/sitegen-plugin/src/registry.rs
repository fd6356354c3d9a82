//! Feature registry. Finds, builds, and keeps the features of one run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::catalog::FeatureCatalog;
use crate::error::FeatureError;
use crate::events::bus::EventBus;
use crate::feature::Feature;
use crate::manifest::FeatureManifest;
use crate::services::{REGISTERED_PLUGINS_VAR, Services};

/// A feature that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFailure {
    /// Feature name, or its directory name when the manifest was unusable.
    pub plugin: String,
    /// Why loading failed.
    pub reason: String,
}

/// Outcome of booting the features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Names of the features loaded, in load order.
    pub loaded: Vec<String>,
    /// Names of features whose manifest disabled them.
    pub disabled: Vec<String>,
    /// Features that failed to load.
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    fn merge(&mut self, other: LoadReport) {
        self.loaded.extend(other.loaded);
        self.disabled.extend(other.disabled);
        self.failures.extend(other.failures);
    }
}

/// Registry of the features of one run.
///
/// Populated once at boot; afterwards the set of instances never changes,
/// which is what lets features keep state for the whole run.
#[derive(Debug)]
pub struct PluginRegistry {
    /// Directory scanned for feature subdirectories.
    plugin_root: PathBuf,
    /// Factories for manifest entry points.
    catalog: FeatureCatalog,
    /// Loaded features in load order.
    plugins: Vec<Arc<dyn Feature>>,
    /// Feature name → position in `plugins`.
    index: HashMap<String, usize>,
    /// Set once `load_plugins` ran.
    sealed: bool,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new(plugin_root: impl Into<PathBuf>, catalog: FeatureCatalog) -> Self {
        Self {
            plugin_root: plugin_root.into(),
            catalog,
            plugins: Vec::new(),
            index: HashMap::new(),
            sealed: false,
        }
    }

    /// Registers a compiled-in feature before boot.
    pub fn add(
        &mut self,
        feature: Arc<dyn Feature>,
        bus: &mut EventBus,
        services: &Services,
    ) -> Result<(), FeatureError> {
        if self.sealed {
            return Err(FeatureError::registration(format!(
                "cannot add '{}': features are already loaded",
                feature.name()
            )));
        }
        self.install(feature, bus, services)
    }

    /// Scans the plugin root and loads every feature found there.
    ///
    /// Each subdirectory holding a `feature.toml` is one feature. A broken
    /// feature is logged and reported but never stops the others. Afterwards
    /// the `registered_plugins` variable lists every loaded feature, and the
    /// registry accepts no further features.
    pub fn load_plugins(&mut self, bus: &mut EventBus, services: &Services) -> LoadReport {
        let mut report = LoadReport::default();

        if self.sealed {
            warn!("Features already loaded, ignoring second load");
            return report;
        }

        for dir in self.feature_dirs(&mut report) {
            report.merge(self.load_dir(&dir, bus, services));
        }

        self.sealed = true;
        let names = self.names();
        services.set_var(REGISTERED_PLUGINS_VAR, json!(names));

        info!(
            loaded = self.plugins.len(),
            failed = report.failures.len(),
            disabled = report.disabled.len(),
            "Features loaded"
        );

        report.loaded = names;
        report
    }

    /// Lists feature directories in name order.
    fn feature_dirs(&self, report: &mut LoadReport) -> Vec<PathBuf> {
        if !self.plugin_root.is_dir() {
            warn!(
                root = %self.plugin_root.display(),
                "Feature directory not found, no external features loaded"
            );
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.plugin_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.plugin_root.display(), error = %e, "Cannot read feature directory");
                report.failures.push(LoadFailure {
                    plugin: self.plugin_root.display().to_string(),
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        dirs
    }

    /// Loads a single feature directory.
    fn load_dir(&mut self, dir: &Path, bus: &mut EventBus, services: &Services) -> LoadReport {
        let mut report = LoadReport::default();
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        let manifest = match FeatureManifest::load(dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(directory = %dir.display(), error = %e, "Skipping feature");
                report.failures.push(LoadFailure {
                    plugin: dir_name,
                    reason: e.to_string(),
                });
                return report;
            }
        };

        if !manifest.enabled {
            info!(plugin_id = %manifest.name, "Feature disabled by manifest");
            report.disabled.push(manifest.name);
            return report;
        }

        let result = self
            .catalog
            .resolve(&manifest)
            .and_then(|feature| self.install(feature, bus, services));

        if let Err(e) = result {
            warn!(
                plugin_id = %manifest.name,
                entry = %manifest.entry,
                error = %e,
                "Skipping feature"
            );
            report.failures.push(LoadFailure {
                plugin: manifest.name,
                reason: e.to_string(),
            });
        }

        report
    }

    /// Registers a feature's listeners and stores the instance.
    fn install(
        &mut self,
        feature: Arc<dyn Feature>,
        bus: &mut EventBus,
        services: &Services,
    ) -> Result<(), FeatureError> {
        let name = feature.name().to_string();
        if self.index.contains_key(&name) {
            return Err(FeatureError::Duplicate(name));
        }

        let checkpoint = bus.checkpoint();
        if let Err(e) = Arc::clone(&feature).register(bus, services) {
            // A half-registered feature must not leave listeners behind
            bus.rollback(checkpoint);
            return Err(e);
        }

        info!(
            plugin_id = %name,
            events = ?feature.event_listeners(),
            "Feature registered"
        );

        self.index.insert(name, self.plugins.len());
        self.plugins.push(feature);
        Ok(())
    }

    /// All loaded features in load order.
    pub fn plugins(&self) -> &[Arc<dyn Feature>] {
        &self.plugins
    }

    /// Looks up a feature by name.
    pub fn plugin(&self, name: &str) -> Option<Arc<dyn Feature>> {
        self.index.get(name).map(|&i| Arc::clone(&self.plugins[i]))
    }

    /// Names of the loaded features in load order.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Number of loaded features.
    pub fn count(&self) -> usize {
        self.plugins.len()
    }

    /// Returns the directory scanned for features.
    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    /// Returns the catalog used to resolve entry points.
    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::definitions::{EventPayload, POST_LOOP, RENDER};
    use crate::events::listener::ClosureListener;
    use crate::manifest::MANIFEST_FILE;
    use sitegen_core::SiteConfig;

    #[derive(Debug)]
    struct Stub {
        name: String,
        fail_after_first: bool,
    }

    impl Feature for Stub {
        fn name(&self) -> &str {
            &self.name
        }

        fn register(self: Arc<Self>, bus: &mut EventBus, _: &Services) -> Result<(), FeatureError> {
            bus.register(RENDER, ClosureListener::arc(&self.name, |_, _| Ok(None)));
            if self.fail_after_first {
                // Registered under a different id than the feature name
                bus.register(POST_LOOP, ClosureListener::arc("helper", |_, _| Ok(None)));
                return Err(FeatureError::registration("second listener unavailable"));
            }
            Ok(())
        }

        fn event_listeners(&self) -> Vec<String> {
            vec![RENDER.to_string()]
        }
    }

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::new()
            .with("stub", |m| {
                Ok(Arc::new(Stub {
                    name: m.name.clone(),
                    fail_after_first: false,
                }) as Arc<dyn Feature>)
            })
            .with("flaky", |m| {
                Ok(Arc::new(Stub {
                    name: m.name.clone(),
                    fail_after_first: true,
                }) as Arc<dyn Feature>)
            })
    }

    fn write_manifest(root: &Path, dir: &str, body: &str) {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join(MANIFEST_FILE), body).expect("write");
    }

    fn setup() -> (Arc<Services>, EventBus) {
        let services = Arc::new(Services::new(SiteConfig::default()));
        let bus = EventBus::new(Arc::clone(&services));
        (services, bus)
    }

    #[test]
    fn test_broken_feature_does_not_stop_others() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_manifest(temp.path(), "a-broken", "name = [oops");
        write_manifest(temp.path(), "b-good", "name = \"good\"\nentry = \"stub\"\n");
        std::fs::create_dir_all(temp.path().join("c-empty")).expect("mkdir");
        write_manifest(temp.path(), "d-unknown", "name = \"ghost\"\nentry = \"nope\"\n");

        let (services, mut bus) = setup();
        let mut registry = PluginRegistry::new(temp.path(), catalog());
        let report = registry.load_plugins(&mut bus, &services);

        assert_eq!(report.loaded, vec!["good".to_string()]);
        assert_eq!(report.failures.len(), 3);
        assert_eq!(report.failures[0].plugin, "a-broken");
        assert_eq!(report.failures[1].plugin, "c-empty");
        assert_eq!(report.failures[2].plugin, "ghost");
        assert!(registry.plugin("good").is_some());
        assert!(registry.plugin("ghost").is_none());
        assert_eq!(bus.listener_count(RENDER), 1);
        assert_eq!(services.registered_plugins(), vec!["good".to_string()]);
    }

    #[test]
    fn test_load_order_is_directory_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_manifest(temp.path(), "20-second", "name = \"second\"\nentry = \"stub\"\n");
        write_manifest(temp.path(), "10-first", "name = \"first\"\nentry = \"stub\"\n");

        let (services, mut bus) = setup();
        let mut registry = PluginRegistry::new(temp.path(), catalog());
        registry.load_plugins(&mut bus, &services);

        assert_eq!(registry.names(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_disabled_and_duplicate() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_manifest(
            temp.path(),
            "a",
            "name = \"off\"\nentry = \"stub\"\nenabled = false\n",
        );
        write_manifest(temp.path(), "b", "name = \"twin\"\nentry = \"stub\"\n");
        write_manifest(temp.path(), "c", "name = \"twin\"\nentry = \"stub\"\n");

        let (services, mut bus) = setup();
        let mut registry = PluginRegistry::new(temp.path(), catalog());
        let report = registry.load_plugins(&mut bus, &services);

        assert_eq!(report.disabled, vec!["off".to_string()]);
        assert_eq!(report.loaded, vec!["twin".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(bus.listener_count(RENDER), 1);
    }

    #[test]
    fn test_failed_registration_leaves_no_listeners() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_manifest(temp.path(), "a", "name = \"flaky\"\nentry = \"flaky\"\n");

        let (services, mut bus) = setup();
        let mut registry = PluginRegistry::new(temp.path(), catalog());
        let report = registry.load_plugins(&mut bus, &services);

        assert!(report.loaded.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(!bus.has_listeners(RENDER));
        assert!(!bus.has_listeners(POST_LOOP));
        assert_eq!(bus.fire(RENDER, EventPayload::Empty).unwrap(), EventPayload::Empty);
    }

    #[test]
    fn test_failed_registration_keeps_earlier_features() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_manifest(temp.path(), "a", "name = \"good\"\nentry = \"stub\"\n");
        write_manifest(temp.path(), "b", "name = \"flaky\"\nentry = \"flaky\"\n");

        let (services, mut bus) = setup();
        let mut registry = PluginRegistry::new(temp.path(), catalog());
        let report = registry.load_plugins(&mut bus, &services);

        assert_eq!(report.loaded, vec!["good".to_string()]);
        assert_eq!(bus.listener_count(RENDER), 1);
        assert!(!bus.has_listeners(POST_LOOP));
    }

    #[test]
    fn test_missing_root_resets_registered_plugins() {
        let (services, mut bus) = setup();
        services.set_var(REGISTERED_PLUGINS_VAR, json!(["stale"]));

        let mut registry = PluginRegistry::new("/definitely/not/here", catalog());
        let report = registry.load_plugins(&mut bus, &services);

        assert!(report.loaded.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(services.var(REGISTERED_PLUGINS_VAR), Some(json!([])));
    }

    #[test]
    fn test_add_before_and_after_boot() {
        let (services, mut bus) = setup();
        let mut registry = PluginRegistry::new("/definitely/not/here", catalog());
        let builtin = Arc::new(Stub {
            name: "builtin".to_string(),
            fail_after_first: false,
        });

        registry.add(builtin.clone(), &mut bus, &services).unwrap();
        let report = registry.load_plugins(&mut bus, &services);
        assert_eq!(report.loaded, vec!["builtin".to_string()]);

        assert!(registry.add(builtin, &mut bus, &services).is_err());
        assert_eq!(registry.count(), 1);
    }
}
