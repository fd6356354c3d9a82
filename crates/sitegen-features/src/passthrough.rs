//! Passthrough renderer: copies the source text into the render context.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use sitegen_plugin::prelude::*;

/// Renders a file by reading it verbatim.
///
/// Files that already carry rendered content are left to whoever rendered
/// them. With a non-empty extension list only matching files are rendered.
#[derive(Debug)]
pub struct Passthrough {
    /// Feature name.
    name: String,
    /// Lower-case extensions to render; empty means all.
    extensions: Vec<String>,
}

impl Passthrough {
    /// Catalog entry and default name.
    pub const ENTRY: &'static str = "passthrough";

    const LISTENERS: &'static [ListenerSpec<Self>] = &[ListenerSpec::new(RENDER, Self::render)];

    /// Creates a passthrough renderer for every file.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extensions: Vec::new(),
        }
    }

    /// Restricts rendering to the given extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Builds the feature from a manifest (`options.extensions`).
    pub fn from_manifest(manifest: &FeatureManifest) -> Self {
        Self::new(&manifest.name).with_extensions(manifest.option_list("extensions"))
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    fn render(&self, payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult {
        let Some(render) = payload.as_render() else {
            return Ok(None);
        };
        if render.rendered_content.is_some() || !self.accepts(&render.file_path) {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&render.file_path)?;
        let mut render = render.clone();
        if render.output_path.is_none() {
            render.output_path = Some(ctx.services.mapper().output_path(&render.file_path));
        }

        debug!(
            plugin_id = %self.name,
            file = %render.file_path.display(),
            bytes = content.len(),
            "Rendered file verbatim"
        );
        render.rendered_content = Some(content);
        Ok(Some(EventPayload::Render(render)))
    }
}

impl Feature for Passthrough {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Renders source files verbatim"
    }

    fn register(self: Arc<Self>, bus: &mut EventBus, _services: &Services) -> Result<(), FeatureError> {
        register_listener_table(&self, bus, Self::LISTENERS);
        Ok(())
    }

    fn event_listeners(&self) -> Vec<String> {
        table_events(Self::LISTENERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_core::SiteConfig;

    fn setup(root: &Path) -> (EventBus, Arc<Services>) {
        let mut config = SiteConfig::default();
        config.paths.source_dir = root.join("content");
        config.paths.output_dir = root.join("public");
        let services = Arc::new(Services::new(config));
        (EventBus::new(Arc::clone(&services)), services)
    }

    fn context_for(path: &Path) -> RenderContext {
        RenderContext::for_file(&DiscoveredFile::new(path, "/"))
    }

    #[test]
    fn test_renders_source_and_maps_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("content/about.md");
        std::fs::create_dir_all(source.parent().expect("parent")).expect("mkdir");
        std::fs::write(&source, "# About").expect("write");

        let (mut bus, services) = setup(temp.path());
        Arc::new(Passthrough::new("passthrough"))
            .register(&mut bus, &services)
            .expect("register");

        let out = bus
            .fire(RENDER, EventPayload::Render(context_for(&source)))
            .expect("fire")
            .into_render()
            .expect("render payload");

        assert_eq!(out.rendered_content.as_deref(), Some("# About"));
        assert_eq!(out.output_path, Some(temp.path().join("public/about.html")));
    }

    #[test]
    fn test_extension_filter_and_existing_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (mut bus, services) = setup(temp.path());
        Arc::new(Passthrough::new("passthrough").with_extensions([".HTML"]))
            .register(&mut bus, &services)
            .expect("register");

        // Not an accepted extension: never read, so a missing file is fine
        let md = context_for(&temp.path().join("content/missing.md"));
        let out = bus.fire(RENDER, EventPayload::Render(md.clone())).expect("fire");
        assert_eq!(out.as_render(), Some(&md));

        let mut rendered = context_for(&temp.path().join("content/missing.html"));
        rendered.rendered_content = Some("<p>done</p>".to_string());
        let out = bus
            .fire(RENDER, EventPayload::Render(rendered.clone()))
            .expect("fire");
        assert_eq!(out.as_render(), Some(&rendered));
    }

    #[test]
    fn test_unreadable_source_is_listener_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (mut bus, services) = setup(temp.path());
        Arc::new(Passthrough::new("passthrough"))
            .register(&mut bus, &services)
            .expect("register");

        let ctx = context_for(&temp.path().join("content/gone.md"));
        let err = bus.fire(RENDER, EventPayload::Render(ctx)).unwrap_err();
        assert_eq!(err.plugin_id, "passthrough");
        assert!(matches!(err.source, FeatureError::Io(_)));
    }

    #[test]
    fn test_from_manifest_reads_extensions() {
        let manifest = FeatureManifest::inline("raw-html", Passthrough::ENTRY)
            .with_option("extensions", serde_json::json!(["html", "htm"]));
        let feature = Passthrough::from_manifest(&manifest);
        assert_eq!(feature.name(), "raw-html");
        assert!(feature.accepts(Path::new("a/b.HTM")));
        assert!(!feature.accepts(Path::new("a/b.md")));
    }
}
