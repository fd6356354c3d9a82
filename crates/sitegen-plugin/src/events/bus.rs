//! Event bus: priority-ordered listener registration and synchronous dispatch.
//!
//! - Listeners run in ascending priority; equal priorities keep registration
//!   order.
//! - Each listener sees the payload produced by the previous one. Returning
//!   a payload replaces it, returning nothing keeps it.
//! - A failing listener stops the rest of that `fire`; the caller decides
//!   what the failure means for the run.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, trace};

use super::definitions::{EventPayload, LifecycleEvent};
use super::listener::{EventContext, EventListener};
use crate::error::FeatureError;
use crate::services::Services;

/// Default listener priority.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A listener failure, carrying the payload accumulated up to that point.
#[derive(Debug, Error)]
#[error("listener of '{plugin_id}' failed during '{event}': {source}")]
pub struct DispatchError {
    /// Event being fired.
    pub event: String,
    /// Feature owning the failing listener.
    pub plugin_id: String,
    /// The listener's error.
    pub source: FeatureError,
    /// Payload as it stood before the failing listener ran.
    pub payload: EventPayload,
    /// Feature whose listener last replaced the payload, if any did.
    pub replaced_by: Option<String>,
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Final payload.
    pub payload: EventPayload,
    /// Feature whose listener last replaced the payload, if any did.
    pub replaced_by: Option<String>,
}

/// Marks the listener table at a point in time; see [`EventBus::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    seq: u64,
    declared: usize,
}

/// Entry in the listener table.
#[derive(Debug)]
struct ListenerEntry {
    /// The listener.
    listener: Arc<dyn EventListener>,
    /// Priority (lower = earlier execution).
    priority: i32,
    /// Feature that registered this listener.
    plugin_id: String,
    /// Registration sequence number.
    seq: u64,
}

/// Registry and dispatcher of listeners, keyed by event name.
#[derive(Debug)]
pub struct EventBus {
    /// Event name → listeners sorted by priority.
    listeners: HashMap<String, Vec<ListenerEntry>>,
    /// Known event names in declaration order.
    declared: Vec<String>,
    /// Services handed to every listener call.
    services: Arc<Services>,
    /// Sequence number of the next registration.
    next_seq: u64,
}

impl EventBus {
    /// Creates a bus with the lifecycle events declared and no listeners.
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            listeners: HashMap::new(),
            declared: LifecycleEvent::ALL
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
            services,
            next_seq: 0,
        }
    }

    /// Registers a listener with the default priority.
    pub fn register(&mut self, event: &str, listener: Arc<dyn EventListener>) {
        self.register_listener(event, listener, DEFAULT_PRIORITY);
    }

    /// Registers a listener for an event.
    ///
    /// The same listener may be registered more than once; every
    /// registration fires.
    pub fn register_listener(&mut self, event: &str, listener: Arc<dyn EventListener>, priority: i32) {
        let plugin_id = listener.plugin_id().to_string();
        self.declare(event);

        let seq = self.next_seq;
        self.next_seq += 1;

        let entries = self.listeners.entry(event.to_string()).or_default();
        entries.push(ListenerEntry {
            listener,
            priority,
            plugin_id: plugin_id.clone(),
            seq,
        });

        // Stable: ties stay in registration order
        entries.sort_by_key(|e| e.priority);

        debug!(
            event = %event,
            plugin_id = %plugin_id,
            priority = priority,
            "Listener registered"
        );
    }

    /// Removes every registration of `listener` for `event`.
    ///
    /// Listeners are matched by identity. Returns how many registrations
    /// were removed.
    pub fn unregister_listener(&mut self, event: &str, listener: &Arc<dyn EventListener>) -> usize {
        let Some(entries) = self.listeners.get_mut(event) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|e| !Arc::ptr_eq(&e.listener, listener));
        let removed = before - entries.len();

        if entries.is_empty() {
            self.listeners.remove(event);
        }

        if removed > 0 {
            debug!(event = %event, removed = removed, "Listener unregistered");
        }
        removed
    }

    /// Removes every listener owned by a feature.
    pub fn unregister_plugin(&mut self, plugin_id: &str) {
        for entries in self.listeners.values_mut() {
            entries.retain(|e| e.plugin_id != plugin_id);
        }

        // Remove empty event entries
        self.listeners.retain(|_, entries| !entries.is_empty());

        info!(plugin_id = %plugin_id, "All listeners unregistered for feature");
    }

    /// Marks the current state of the listener table.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            seq: self.next_seq,
            declared: self.declared.len(),
        }
    }

    /// Removes every registration and declaration made after `checkpoint`,
    /// whatever plugin id the listeners carry. Returns how many
    /// registrations were removed.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> usize {
        let mut removed = 0;
        for entries in self.listeners.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.seq < checkpoint.seq);
            removed += before - entries.len();
        }
        self.listeners.retain(|_, entries| !entries.is_empty());
        self.declared.truncate(checkpoint.declared);

        if removed > 0 {
            debug!(removed = removed, "Listener registrations rolled back");
        }
        removed
    }

    /// Declares an event name without registering a listener.
    pub fn declare(&mut self, event: &str) {
        if !self.declared.iter().any(|e| e == event) {
            self.declared.push(event.to_string());
        }
    }

    /// Fires an event through its listeners and returns the final payload.
    ///
    /// With no listeners the payload comes back untouched.
    pub fn fire(&self, event: &str, payload: EventPayload) -> Result<EventPayload, DispatchError> {
        self.dispatch(event, payload).map(|d| d.payload)
    }

    /// Like [`fire`](Self::fire), also reporting which feature last
    /// replaced the payload.
    pub fn dispatch(&self, event: &str, payload: EventPayload) -> Result<Dispatched, DispatchError> {
        let entries = match self.listeners.get(event) {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                trace!(event = %event, "No listeners, payload unchanged");
                return Ok(Dispatched {
                    payload,
                    replaced_by: None,
                });
            }
        };

        debug!(
            event = %event,
            listener_count = entries.len(),
            payload = payload.kind(),
            "Firing event"
        );

        let ctx = EventContext {
            event,
            bus: self,
            services: &self.services,
        };

        let mut current = payload;
        let mut replaced_by = None;
        for entry in entries {
            match entry.listener.handle(&current, &ctx) {
                Ok(Some(next)) => {
                    trace!(
                        event = %event,
                        plugin_id = %entry.plugin_id,
                        payload = next.kind(),
                        "Listener replaced payload"
                    );
                    current = next;
                    replaced_by = Some(entry.plugin_id.clone());
                }
                Ok(None) => {}
                Err(source) => {
                    return Err(DispatchError {
                        event: event.to_string(),
                        plugin_id: entry.plugin_id.clone(),
                        source,
                        payload: current,
                        replaced_by,
                    });
                }
            }
        }

        Ok(Dispatched {
            payload: current,
            replaced_by,
        })
    }

    /// Known event names: lifecycle events in firing order, then ad-hoc
    /// events in the order they were first seen.
    pub fn list(&self) -> Vec<String> {
        self.declared.clone()
    }

    /// Returns whether any listener is registered for an event.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Returns the number of registrations for an event.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns the services handed to listeners.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::listener::ClosureListener;
    use parking_lot::Mutex;
    use serde_json::json;
    use sitegen_core::SiteConfig;

    fn bus() -> EventBus {
        EventBus::new(Arc::new(Services::new(SiteConfig::default())))
    }

    fn recorder(id: &str, log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Arc<dyn EventListener> {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        ClosureListener::arc(id, move |_, _| {
            log.lock().push(tag.clone());
            Ok(None)
        })
    }

    fn counter(n: i64) -> EventPayload {
        EventPayload::Data(json!({ "n": n }))
    }

    fn increment(id: &str) -> Arc<dyn EventListener> {
        ClosureListener::arc(id, |payload, _| {
            let n = payload
                .as_data()
                .and_then(|v| v["n"].as_i64())
                .ok_or_else(|| FeatureError::listener("missing n"))?;
            Ok(Some(counter(n + 1)))
        })
    }

    #[test]
    fn test_priority_order() {
        let mut bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register_listener("x", recorder("a", &log, "200"), 200);
        bus.register_listener("x", recorder("b", &log, "50"), 50);
        bus.register_listener("x", recorder("c", &log, "100"), 100);

        bus.fire("x", EventPayload::Empty).unwrap();
        assert_eq!(*log.lock(), vec!["50", "100", "200"]);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let mut bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register("x", recorder("a", &log, "first"));
        bus.register("x", recorder("b", &log, "second"));
        bus.register_listener("x", recorder("c", &log, "early"), 10);
        bus.register("x", recorder("d", &log, "third"));

        bus.fire("x", EventPayload::Empty).unwrap();
        assert_eq!(*log.lock(), vec!["early", "first", "second", "third"]);
    }

    #[test]
    fn test_payload_threading() {
        let mut bus = bus();
        bus.register_listener("x", increment("a"), 1);
        bus.register_listener("x", increment("b"), 2);

        let result = bus.fire("x", counter(1)).unwrap();
        assert_eq!(result, counter(3));
    }

    #[test]
    fn test_none_keeps_payload() {
        let mut bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register_listener("x", increment("a"), 1);
        bus.register_listener("x", recorder("b", &log, "seen"), 2);

        let result = bus.fire("x", counter(1)).unwrap();
        assert_eq!(result, counter(2));
    }

    #[test]
    fn test_no_listeners_returns_input() {
        let bus = bus();
        let input = EventPayload::Data(json!({ "nested": { "list": [1, 2, 3] } }));
        let result = bus.fire("nobody_listens", input.clone()).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let mut bus = bus();
        let listener = increment("a");
        bus.register("x", Arc::clone(&listener));
        bus.register("x", listener);

        assert_eq!(bus.fire("x", counter(0)).unwrap(), counter(2));
    }

    #[test]
    fn test_unregister_removes_all_matching() {
        let mut bus = bus();
        let listener = increment("a");
        let other = increment("b");
        bus.register("x", Arc::clone(&listener));
        bus.register("x", Arc::clone(&other));
        bus.register("x", Arc::clone(&listener));

        assert_eq!(bus.unregister_listener("x", &listener), 2);
        assert_eq!(bus.listener_count("x"), 1);
        assert_eq!(bus.unregister_listener("x", &listener), 0);
        assert_eq!(bus.unregister_listener("missing", &listener), 0);
    }

    #[test]
    fn test_unregister_plugin() {
        let mut bus = bus();
        bus.register("x", increment("a"));
        bus.register("y", increment("a"));
        bus.register("y", increment("b"));

        bus.unregister_plugin("a");
        assert!(!bus.has_listeners("x"));
        assert_eq!(bus.listener_count("y"), 1);
    }

    #[test]
    fn test_rollback_removes_listeners_under_any_id() {
        let mut bus = bus();
        bus.register("x", increment("kept"));
        let checkpoint = bus.checkpoint();

        bus.register("x", increment("half"));
        bus.register("y", increment("helper"));
        bus.declare("half_ready");

        assert_eq!(bus.rollback(checkpoint), 2);
        assert_eq!(bus.listener_count("x"), 1);
        assert!(!bus.has_listeners("y"));
        assert!(!bus.list().contains(&"half_ready".to_string()));
        assert!(!bus.list().contains(&"y".to_string()));
        assert_eq!(bus.fire("x", counter(0)).unwrap(), counter(1));
    }

    #[test]
    fn test_dispatch_reports_last_replacer() {
        let mut bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register_listener("x", increment("first"), 1);
        bus.register_listener("x", increment("second"), 2);
        bus.register_listener("x", recorder("watcher", &log, "seen"), 3);

        let dispatched = bus.dispatch("x", counter(0)).unwrap();
        assert_eq!(dispatched.payload, counter(2));
        assert_eq!(dispatched.replaced_by.as_deref(), Some("second"));

        let untouched = bus.dispatch("nobody", counter(0)).unwrap();
        assert_eq!(untouched.replaced_by, None);
    }

    #[test]
    fn test_error_stops_remaining_listeners() {
        let mut bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register_listener("x", increment("first"), 1);
        bus.register_listener(
            "x",
            ClosureListener::arc("broken", |_, _| Err(FeatureError::listener("boom"))),
            2,
        );
        bus.register_listener("x", recorder("last", &log, "ran"), 3);

        let err = bus.fire("x", counter(0)).unwrap_err();
        assert_eq!(err.event, "x");
        assert_eq!(err.plugin_id, "broken");
        assert_eq!(err.payload, counter(1));
        assert_eq!(err.replaced_by.as_deref(), Some("first"));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_listener_can_fire_adhoc_event() {
        let mut bus = bus();
        bus.register("inner", increment("b"));
        bus.register(
            "outer",
            ClosureListener::arc("a", |payload, ctx| {
                let inner = ctx
                    .bus
                    .fire("inner", payload.clone())
                    .map_err(|e| FeatureError::listener(e.to_string()))?;
                Ok(Some(inner))
            }),
        );

        assert_eq!(bus.fire("outer", counter(5)).unwrap(), counter(6));
    }

    #[test]
    fn test_list_declared_events() {
        let mut bus = bus();
        bus.register("sitemap_written", increment("a"));
        bus.declare("feed_ready");
        bus.register("render", increment("b"));

        let names = bus.list();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "create");
        assert_eq!(names[8], "destroy");
        assert_eq!(names[9], "sitemap_written");
        assert_eq!(names[10], "feed_ready");
    }
}
