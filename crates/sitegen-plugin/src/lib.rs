//! # sitegen-plugin
//!
//! Feature framework for sitegen. Provides:
//!
//! - An event bus with priority-ordered listeners and payload threading
//! - The fixed lifecycle event names plus open ad-hoc events
//! - The `Feature` trait and a declarative listener-table helper
//! - A services container injected into every registration and listener call
//! - Feature discovery from `feature.toml` manifests resolved through a catalog

pub mod catalog;
pub mod error;
pub mod events;
pub mod feature;
pub mod manifest;
pub mod prelude;
pub mod registry;
pub mod services;

pub use catalog::FeatureCatalog;
pub use error::FeatureError;
pub use events::bus::{Checkpoint, DispatchError, Dispatched, EventBus};
pub use events::definitions::{EventPayload, LifecycleEvent};
pub use events::listener::{ClosureListener, EventContext, EventListener, ListenerResult};
pub use feature::{Feature, ListenerSpec};
pub use manifest::FeatureManifest;
pub use registry::{LoadFailure, LoadReport, PluginRegistry};
pub use services::Services;
