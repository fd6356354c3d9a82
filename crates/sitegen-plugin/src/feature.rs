//! The `Feature` trait and the declarative listener-table helper.
//!
//! A feature is created once per run, registers its listeners once, and may
//! keep private state for the whole run. Features that map events onto their
//! own methods describe the mapping as a table and hand it to
//! [`register_listener_table`]:
//!
//! ```rust,ignore
//! impl Feature for Sitemap {
//!     fn name(&self) -> &str { &self.name }
//!
//!     fn register(self: Arc<Self>, bus: &mut EventBus, _: &Services) -> Result<(), FeatureError> {
//!         register_listener_table(&self, bus, Self::LISTENERS);
//!         Ok(())
//!     }
//!
//!     fn event_listeners(&self) -> Vec<String> { table_events(Self::LISTENERS) }
//! }
//!
//! impl Sitemap {
//!     const LISTENERS: &'static [ListenerSpec<Self>] = &[
//!         ListenerSpec::new(POST_RENDER, Self::collect),
//!         ListenerSpec::new(POST_LOOP, Self::write).with_priority(200),
//!     ];
//! }
//! ```

use std::sync::Arc;

use crate::error::FeatureError;
use crate::events::bus::{DEFAULT_PRIORITY, EventBus};
use crate::events::definitions::EventPayload;
use crate::events::listener::{EventContext, EventListener, ListenerResult};
use crate::services::Services;

/// Trait that all features must implement.
pub trait Feature: Send + Sync + std::fmt::Debug {
    /// Unique feature name; the registry key.
    fn name(&self) -> &str;

    /// Short human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Subscribes the feature's listeners. Called exactly once per run.
    fn register(self: Arc<Self>, bus: &mut EventBus, services: &Services) -> Result<(), FeatureError>;

    /// Events this feature listens to, for diagnostics.
    fn event_listeners(&self) -> Vec<String>;
}

/// A feature method usable as a listener.
pub type ListenerMethod<F> = fn(&F, &EventPayload, &EventContext<'_>) -> ListenerResult;

/// One row of a declarative listener table.
pub struct ListenerSpec<F: 'static> {
    /// Event to listen to.
    pub event: &'static str,
    /// Priority (lower = runs earlier).
    pub priority: i32,
    /// Method invoked for the event.
    pub method: ListenerMethod<F>,
}

impl<F: 'static> ListenerSpec<F> {
    /// A row with the default priority.
    pub const fn new(event: &'static str, method: ListenerMethod<F>) -> Self {
        Self {
            event,
            priority: DEFAULT_PRIORITY,
            method,
        }
    }

    /// Overrides the priority.
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Adapts a feature method to the `EventListener` trait.
struct MethodListener<F: Feature + 'static> {
    /// The feature instance the method runs on.
    feature: Arc<F>,
    /// The method.
    method: ListenerMethod<F>,
}

impl<F: Feature + 'static> std::fmt::Debug for MethodListener<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodListener")
            .field("feature", &self.feature.name())
            .finish()
    }
}

impl<F: Feature + 'static> EventListener for MethodListener<F> {
    fn handle(&self, payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult {
        (self.method)(&self.feature, payload, ctx)
    }

    fn plugin_id(&self) -> &str {
        self.feature.name()
    }
}

/// Registers every row of `table` on the bus, bound to `feature`.
pub fn register_listener_table<F: Feature + 'static>(
    feature: &Arc<F>,
    bus: &mut EventBus,
    table: &[ListenerSpec<F>],
) {
    for spec in table {
        let listener = Arc::new(MethodListener {
            feature: Arc::clone(feature),
            method: spec.method,
        });
        bus.register_listener(spec.event, listener, spec.priority);
    }
}

/// Event names of a listener table, first occurrence order.
pub fn table_events<F: 'static>(table: &[ListenerSpec<F>]) -> Vec<String> {
    let mut events: Vec<String> = Vec::new();
    for spec in table {
        if !events.iter().any(|e| e == spec.event) {
            events.push(spec.event.to_string());
        }
    }
    events
}
