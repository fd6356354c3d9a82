//! Event system: the bus, listener traits, and lifecycle definitions.

pub mod bus;
pub mod definitions;
pub mod listener;

pub use bus::{Checkpoint, DispatchError, Dispatched, EventBus};
pub use definitions::{EventPayload, LifecycleEvent};
pub use listener::{ClosureListener, EventContext, EventListener, ListenerResult};
