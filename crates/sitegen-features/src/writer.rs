//! Output writer.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use sitegen_plugin::prelude::*;

/// Writes rendered content to disk.
///
/// Runs early in `post_render` so later listeners see the file on disk.
/// Files nobody rendered are ignored.
#[derive(Debug)]
pub struct Writer {
    /// Feature name.
    name: String,
    /// Paths written during the run.
    written: Mutex<Vec<PathBuf>>,
}

impl Writer {
    /// Catalog entry and default name.
    pub const ENTRY: &'static str = "writer";

    const LISTENERS: &'static [ListenerSpec<Self>] = &[
        ListenerSpec::new(POST_RENDER, Self::write).with_priority(10),
        ListenerSpec::new(POST_LOOP, Self::summarize),
    ];

    /// Creates a writer.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Paths written so far.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().clone()
    }

    fn write(&self, payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult {
        let Some(render) = payload.as_render() else {
            return Ok(None);
        };
        let Some(content) = render.rendered_content.as_deref() else {
            return Ok(None);
        };

        let target = render
            .output_path
            .clone()
            .unwrap_or_else(|| ctx.services.mapper().output_path(&render.file_path));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;

        debug!(
            plugin_id = %self.name,
            file = %render.file_path.display(),
            output = %target.display(),
            "Wrote output"
        );
        self.written.lock().push(target);
        Ok(None)
    }

    fn summarize(&self, _payload: &EventPayload, _ctx: &EventContext<'_>) -> ListenerResult {
        info!(plugin_id = %self.name, files = self.written.lock().len(), "Output written");
        Ok(None)
    }
}

impl Feature for Writer {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Writes rendered files to the output directory"
    }

    fn register(self: Arc<Self>, bus: &mut EventBus, _services: &Services) -> Result<(), FeatureError> {
        register_listener_table(&self, bus, Self::LISTENERS);
        Ok(())
    }

    fn event_listeners(&self) -> Vec<String> {
        table_events(Self::LISTENERS)
    }
}
