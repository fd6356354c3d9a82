//! Services container shared with every feature.
//!
//! The engine passes it explicitly into `Feature::register` and, through
//! [`EventContext`](crate::events::listener::EventContext), into every
//! listener call. Apart from the site configuration and the
//! `registered_plugins` variable the engine never looks at what features
//! store here.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use sitegen_core::SiteConfig;
use sitegen_core::types::OutputMapper;

/// Variable holding the names of the features loaded for this run.
pub const REGISTERED_PLUGINS_VAR: &str = "registered_plugins";

type ServiceMap = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// Shared configuration, typed services, and run variables.
pub struct Services {
    /// Site configuration for this run.
    config: Arc<SiteConfig>,
    /// Typed services keyed by name.
    services: RwLock<ServiceMap>,
    /// Mutable variables visible to every later phase of the run.
    vars: RwLock<HashMap<String, Value>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<String> = self.services.read().keys().cloned().collect();
        services.sort();
        f.debug_struct("Services")
            .field("services", &services)
            .field("vars", &self.vars.read().len())
            .finish()
    }
}

impl Services {
    /// Creates a container for one run.
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config: Arc::new(config),
            services: RwLock::new(HashMap::new()),
            vars: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the site configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Returns an output mapper for the configured layout.
    pub fn mapper(&self) -> OutputMapper {
        OutputMapper::from_config(&self.config)
    }

    /// Stores a typed service under `key`, replacing any previous one.
    pub fn provide<T: Any + Send + Sync>(&self, key: &str, service: T) {
        self.services
            .write()
            .insert(key.to_string(), Arc::new(service));
    }

    /// Fetches a typed service. Absent keys and type mismatches yield `None`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let service = self.services.read().get(key).cloned()?;
        service.downcast::<T>().ok()
    }

    /// Sets a run variable.
    pub fn set_var(&self, key: &str, value: Value) {
        self.vars.write().insert(key.to_string(), value);
    }

    /// Reads a run variable.
    pub fn var(&self, key: &str) -> Option<Value> {
        self.vars.read().get(key).cloned()
    }

    /// Updates a run variable, starting from `null` if unset.
    ///
    /// `update` runs on a copy with no lock held, so it may read or set other
    /// variables. The copy is stored when it returns.
    pub fn update_var<F>(&self, key: &str, update: F)
    where
        F: FnOnce(&mut Value),
    {
        let mut value = self.var(key).unwrap_or(Value::Null);
        update(&mut value);
        self.set_var(key, value);
    }

    /// Removes a run variable, returning its value.
    pub fn remove_var(&self, key: &str) -> Option<Value> {
        self.vars.write().remove(key)
    }

    /// Names of the features registered for this run.
    pub fn registered_plugins(&self) -> Vec<String> {
        self.var(REGISTERED_PLUGINS_VAR)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}
