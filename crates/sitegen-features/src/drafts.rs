//! Draft and partial filtering.

use std::sync::Arc;

use tracing::{debug, info};

use sitegen_plugin::prelude::*;

/// Metadata flag that marks a discovered file as a draft.
pub const DRAFT_FLAG: &str = "draft";

/// Keeps drafts and partials out of the output.
///
/// At `post_glob` files flagged `draft = true` are dropped from the list.
/// At `pre_render` files whose name starts with the partial prefix are
/// skipped; other features may still pick them up.
#[derive(Debug)]
pub struct Drafts {
    /// Feature name.
    name: String,
    /// File name prefix of partials.
    partial_prefix: String,
}

impl Drafts {
    /// Catalog entry and default name.
    pub const ENTRY: &'static str = "drafts";

    const LISTENERS: &'static [ListenerSpec<Self>] = &[
        ListenerSpec::new(POST_GLOB, Self::drop_drafts),
        ListenerSpec::new(PRE_RENDER, Self::skip_partials).with_priority(10),
    ];

    /// Creates the feature with the `_` partial prefix.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            partial_prefix: "_".to_string(),
        }
    }

    /// Builds the feature from a manifest (`options.partial_prefix`).
    pub fn from_manifest(manifest: &FeatureManifest) -> Self {
        let mut drafts = Self::new(&manifest.name);
        if let Some(prefix) = manifest.option_str("partial_prefix") {
            drafts.partial_prefix = prefix.to_string();
        }
        drafts
    }

    fn drop_drafts(&self, payload: &EventPayload, _ctx: &EventContext<'_>) -> ListenerResult {
        let Some(files) = payload.as_files() else {
            return Ok(None);
        };

        let kept: Vec<DiscoveredFile> = files
            .iter()
            .filter(|f| !f.flag(DRAFT_FLAG))
            .cloned()
            .collect();
        if kept.len() == files.len() {
            return Ok(None);
        }

        info!(
            plugin_id = %self.name,
            dropped = files.len() - kept.len(),
            "Dropped draft files"
        );
        Ok(Some(EventPayload::Files(kept)))
    }

    fn skip_partials(&self, payload: &EventPayload, _ctx: &EventContext<'_>) -> ListenerResult {
        let Some(render) = payload.as_render() else {
            return Ok(None);
        };
        if self.partial_prefix.is_empty() {
            return Ok(None);
        }

        match render.file_name() {
            Some(name) if name.starts_with(&self.partial_prefix) => {
                debug!(plugin_id = %self.name, file = %render.file_path.display(), "Skipping partial");
                Ok(Some(EventPayload::Render(render.clone().skip())))
            }
            _ => Ok(None),
        }
    }
}

impl Feature for Drafts {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Drops draft files and skips partials"
    }

    fn register(self: Arc<Self>, bus: &mut EventBus, _services: &Services) -> Result<(), FeatureError> {
        register_listener_table(&self, bus, Self::LISTENERS);
        Ok(())
    }

    fn event_listeners(&self) -> Vec<String> {
        table_events(Self::LISTENERS)
    }
}
