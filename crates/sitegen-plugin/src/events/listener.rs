//! Listener traits and the context handed to every listener call.

use std::sync::Arc;

use super::bus::EventBus;
use super::definitions::EventPayload;
use crate::error::FeatureError;
use crate::services::Services;

/// Result of one listener call.
///
/// `Ok(Some(payload))` replaces the payload for the next listener,
/// `Ok(None)` leaves it as it was.
pub type ListenerResult = Result<Option<EventPayload>, FeatureError>;

/// Everything a listener can reach while handling an event.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    /// Name of the event being dispatched.
    pub event: &'a str,
    /// The bus, for firing ad-hoc events.
    pub bus: &'a EventBus,
    /// Shared services and variables.
    pub services: &'a Services,
}

/// Trait for event listener implementations.
pub trait EventListener: Send + Sync + std::fmt::Debug {
    /// Handles one event with the current payload.
    fn handle(&self, payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult;

    /// Returns the feature owning this listener.
    fn plugin_id(&self) -> &str;
}

type ListenerFn = dyn Fn(&EventPayload, &EventContext<'_>) -> ListenerResult + Send + Sync;

/// A closure-based listener for quick listener creation.
pub struct ClosureListener {
    /// Owning feature.
    id: String,
    /// Handler function.
    handler: Box<ListenerFn>,
}

impl std::fmt::Debug for ClosureListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureListener")
            .field("id", &self.id)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureListener {
    /// Creates a new closure-based listener.
    pub fn new<F>(plugin_id: &str, handler: F) -> Self
    where
        F: Fn(&EventPayload, &EventContext<'_>) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            id: plugin_id.to_string(),
            handler: Box::new(handler),
        }
    }

    /// Creates a listener already wrapped for registration.
    pub fn arc<F>(plugin_id: &str, handler: F) -> Arc<dyn EventListener>
    where
        F: Fn(&EventPayload, &EventContext<'_>) -> ListenerResult + Send + Sync + 'static,
    {
        Arc::new(Self::new(plugin_id, handler))
    }
}

impl EventListener for ClosureListener {
    fn handle(&self, payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult {
        (self.handler)(payload, ctx)
    }

    fn plugin_id(&self) -> &str {
        &self.id
    }
}
