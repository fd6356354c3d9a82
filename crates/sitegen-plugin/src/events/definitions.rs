//! Lifecycle event names and the payload threaded through listeners.

use serde::{Deserialize, Serialize};

use sitegen_core::types::{DiscoveredFile, RenderContext};

/// Fired once, before anything else.
pub const CREATE: &str = "create";
/// Fired once, before discovery.
pub const PRE_GLOB: &str = "pre_glob";
/// Fired once with the discovered files.
pub const POST_GLOB: &str = "post_glob";
/// Fired once with the files about to be rendered.
pub const PRE_LOOP: &str = "pre_loop";
/// Fired per file, before rendering.
pub const PRE_RENDER: &str = "pre_render";
/// Fired per file to produce output.
pub const RENDER: &str = "render";
/// Fired per file after rendering.
pub const POST_RENDER: &str = "post_render";
/// Fired once after every file went through the loop.
pub const POST_LOOP: &str = "post_loop";
/// Fired once, last.
pub const DESTROY: &str = "destroy";

/// The fixed lifecycle events, in firing order.
///
/// Features are not limited to these: any other string is a valid ad-hoc
/// event name that one feature fires and others listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    // ── Whole run ──
    /// Run start.
    Create,
    /// Before discovery.
    PreGlob,
    /// After discovery.
    PostGlob,
    /// Before the render loop.
    PreLoop,

    // ── Per file ──
    /// Before a file renders. Listeners may set `skip_file`.
    PreRender,
    /// Renders a file.
    Render,
    /// After a file rendered.
    PostRender,

    // ── Whole run ──
    /// After the render loop.
    PostLoop,
    /// Run end.
    Destroy,
}

impl LifecycleEvent {
    /// All lifecycle events in firing order.
    pub const ALL: [LifecycleEvent; 9] = [
        Self::Create,
        Self::PreGlob,
        Self::PostGlob,
        Self::PreLoop,
        Self::PreRender,
        Self::Render,
        Self::PostRender,
        Self::PostLoop,
        Self::Destroy,
    ];

    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => CREATE,
            Self::PreGlob => PRE_GLOB,
            Self::PostGlob => POST_GLOB,
            Self::PreLoop => PRE_LOOP,
            Self::PreRender => PRE_RENDER,
            Self::Render => RENDER,
            Self::PostRender => POST_RENDER,
            Self::PostLoop => POST_LOOP,
            Self::Destroy => DESTROY,
        }
    }

    /// Looks up a lifecycle event by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }

    /// Returns whether this event fires once per file.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::PreRender | Self::Render | Self::PostRender)
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters threaded through the listeners of one `fire`.
///
/// A listener that returns a payload replaces the current one for the next
/// listener in the chain; nothing is merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventPayload {
    /// No parameters.
    Empty,
    /// The discovered file list (`post_glob`, `pre_loop`).
    Files(Vec<DiscoveredFile>),
    /// The per-file render context.
    Render(RenderContext),
    /// Free-form data for ad-hoc events and run summaries.
    Data(serde_json::Value),
}

impl EventPayload {
    /// Short name of the payload variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Files(_) => "files",
            Self::Render(_) => "render",
            Self::Data(_) => "data",
        }
    }

    /// Borrows the render context, if this is one.
    pub fn as_render(&self) -> Option<&RenderContext> {
        match self {
            Self::Render(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Takes the render context, if this is one.
    pub fn into_render(self) -> Option<RenderContext> {
        match self {
            Self::Render(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Borrows the file list, if this is one.
    pub fn as_files(&self) -> Option<&[DiscoveredFile]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }

    /// Takes the file list, if this is one.
    pub fn into_files(self) -> Option<Vec<DiscoveredFile>> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }

    /// Borrows the data value, if this is one.
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }
}
