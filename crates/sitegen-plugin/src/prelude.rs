//! Prelude for feature authors.

pub use crate::catalog::FeatureCatalog;
pub use crate::error::FeatureError;
pub use crate::events::bus::EventBus;
pub use crate::events::definitions::{
    CREATE, DESTROY, EventPayload, LifecycleEvent, POST_GLOB, POST_LOOP, POST_RENDER, PRE_GLOB,
    PRE_LOOP, PRE_RENDER, RENDER,
};
pub use crate::events::listener::{ClosureListener, EventContext, EventListener, ListenerResult};
pub use crate::feature::{Feature, ListenerSpec, register_listener_table, table_events};
pub use crate::manifest::FeatureManifest;
pub use crate::services::Services;

pub use sitegen_core::types::{DiscoveredFile, Metadata, RenderContext};
