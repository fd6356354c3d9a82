//! Sitemap generation.
//!
//! Collects the URL of every rendered file during the loop and writes a
//! `sitemap.xml` once the loop is done. Afterwards it fires the ad-hoc
//! [`SITEMAP_WRITTEN`] event so other features can react to the file:
//!
//! ```json
//! { "kind": "data", "value": { "path": "public/sitemap.xml", "urls": ["http://localhost/index.html"] } }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, info};

use sitegen_plugin::prelude::*;

/// Ad-hoc event fired after the sitemap was written.
pub const SITEMAP_WRITTEN: &str = "sitemap_written";

/// Default sitemap file name under the output directory.
pub const DEFAULT_FILE: &str = "sitemap.xml";

/// Writes `sitemap.xml` for the rendered pages.
#[derive(Debug)]
pub struct Sitemap {
    /// Feature name.
    name: String,
    /// File name relative to the output directory.
    file: String,
    /// Site-relative URLs of rendered files, in render order.
    urls: Mutex<Vec<String>>,
}

impl Sitemap {
    /// Catalog entry and default name.
    pub const ENTRY: &'static str = "sitemap";

    const LISTENERS: &'static [ListenerSpec<Self>] = &[
        ListenerSpec::new(POST_RENDER, Self::collect).with_priority(200),
        ListenerSpec::new(POST_LOOP, Self::write),
    ];

    /// Creates a sitemap writer using [`DEFAULT_FILE`].
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            file: DEFAULT_FILE.to_string(),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Builds the feature from a manifest (`options.file`).
    pub fn from_manifest(manifest: &FeatureManifest) -> Self {
        let mut sitemap = Self::new(&manifest.name);
        if let Some(file) = manifest.option_str("file") {
            sitemap.file = file.to_string();
        }
        sitemap
    }

    /// URLs collected so far.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    fn collect(&self, payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult {
        if let Some(render) = payload.as_render() {
            if render.rendered_content.is_some() {
                let url = page_url(render, &ctx.services.config().paths.output_dir);
                self.urls.lock().push(url);
            }
        }
        Ok(None)
    }

    fn write(&self, _payload: &EventPayload, ctx: &EventContext<'_>) -> ListenerResult {
        let config = ctx.services.config();
        let urls: Vec<String> = self
            .urls
            .lock()
            .iter()
            .map(|url| config.site.absolute_url(url))
            .collect();

        let path: PathBuf = config.paths.output_dir.join(&self.file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, render_xml(&urls))?;
        info!(plugin_id = %self.name, path = %path.display(), urls = urls.len(), "Sitemap written");

        let payload = EventPayload::Data(json!({
            "path": path.display().to_string(),
            "urls": urls,
        }));
        ctx.bus.fire(SITEMAP_WRITTEN, payload).map_err(|e| {
            FeatureError::listener(format!(
                "'{}' listener of '{}' failed: {}",
                e.event, e.plugin_id, e.source
            ))
        })?;
        debug!(plugin_id = %self.name, event = SITEMAP_WRITTEN, "Announced sitemap");
        Ok(None)
    }
}

impl Feature for Sitemap {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Writes sitemap.xml for rendered pages"
    }

    fn register(self: Arc<Self>, bus: &mut EventBus, _services: &Services) -> Result<(), FeatureError> {
        bus.declare(SITEMAP_WRITTEN);
        register_listener_table(&self, bus, Self::LISTENERS);
        Ok(())
    }

    fn event_listeners(&self) -> Vec<String> {
        table_events(Self::LISTENERS)
    }
}

/// Site-relative URL of a rendered page. A renderer-chosen `output_path`
/// under the output root wins over the discovered URL.
fn page_url(render: &RenderContext, output_dir: &Path) -> String {
    let relative = render
        .output_path
        .as_deref()
        .and_then(|path| path.strip_prefix(output_dir).ok());
    match relative {
        Some(relative) => {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("/{}", parts.join("/"))
        }
        None => render.url.clone(),
    }
}

fn render_xml(urls: &[String]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape_xml(url));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_core::SiteConfig;

    fn rendered(url: &str) -> EventPayload {
        let mut ctx = RenderContext::for_file(&DiscoveredFile::new(format!("content{url}"), url));
        ctx.rendered_content = Some("x".to_string());
        EventPayload::Render(ctx)
    }

    #[test]
    fn test_writes_sitemap_and_announces_it() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = SiteConfig::default();
        config.site.base_url = "https://example.org/".to_string();
        config.paths.output_dir = temp.path().join("public");
        let services = Arc::new(Services::new(config));
        let mut bus = EventBus::new(Arc::clone(&services));

        let sitemap = Arc::new(Sitemap::new("sitemap"));
        Arc::clone(&sitemap).register(&mut bus, &services).expect("register");

        let announced = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&announced);
        bus.register(
            SITEMAP_WRITTEN,
            ClosureListener::arc("observer", move |payload, _| {
                *slot.lock() = payload.as_data().cloned();
                Ok(None)
            }),
        );

        bus.fire(POST_RENDER, rendered("/index.html")).expect("fire");
        bus.fire(POST_RENDER, rendered("/a&b.html")).expect("fire");
        let unrendered =
            RenderContext::for_file(&DiscoveredFile::new("content/draft.md", "/draft.html"));
        bus.fire(POST_RENDER, EventPayload::Render(unrendered)).expect("fire");
        bus.fire(POST_LOOP, EventPayload::Empty).expect("fire");

        let xml = std::fs::read_to_string(temp.path().join("public/sitemap.xml")).expect("read");
        assert!(xml.contains("<loc>https://example.org/index.html</loc>"));
        assert!(xml.contains("<loc>https://example.org/a&amp;b.html</loc>"));
        assert!(!xml.contains("draft"));

        let data = announced.lock().clone().expect("sitemap_written fired");
        assert_eq!(data["urls"].as_array().map(Vec::len), Some(2));
        assert!(bus.list().contains(&SITEMAP_WRITTEN.to_string()));
    }

    #[test]
    fn test_rendered_output_path_wins_over_discovered_url() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = SiteConfig::default();
        config.paths.output_dir = temp.path().join("public");
        let services = Arc::new(Services::new(config));
        let mut bus = EventBus::new(Arc::clone(&services));
        let sitemap = Arc::new(Sitemap::new("sitemap"));
        Arc::clone(&sitemap).register(&mut bus, &services).expect("register");

        let mut ctx = RenderContext::for_file(&DiscoveredFile::new("content/feed.md", "/feed.html"));
        ctx.rendered_content = Some("<rss/>".to_string());
        ctx.output_path = Some(temp.path().join("public").join("feeds").join("feed.xml"));
        bus.fire(POST_RENDER, EventPayload::Render(ctx)).expect("fire");

        let mut elsewhere = RenderContext::for_file(&DiscoveredFile::new("content/x.md", "/x.html"));
        elsewhere.rendered_content = Some("x".to_string());
        elsewhere.output_path = Some(PathBuf::from("/tmp/outside/x.html"));
        bus.fire(POST_RENDER, EventPayload::Render(elsewhere)).expect("fire");

        assert_eq!(sitemap.urls(), vec!["/feeds/feed.xml".to_string(), "/x.html".to_string()]);
    }

    #[test]
    fn test_failing_observer_fails_post_loop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = SiteConfig::default();
        config.paths.output_dir = temp.path().to_path_buf();
        let services = Arc::new(Services::new(config));
        let mut bus = EventBus::new(Arc::clone(&services));
        Arc::new(Sitemap::new("sitemap"))
            .register(&mut bus, &services)
            .expect("register");
        bus.register(
            SITEMAP_WRITTEN,
            ClosureListener::arc("observer", |_, _| Err(FeatureError::listener("nope"))),
        );

        let err = bus.fire(POST_LOOP, EventPayload::Empty).unwrap_err();
        assert_eq!(err.plugin_id, "sitemap");
        assert!(temp.path().join(DEFAULT_FILE).is_file());
    }
}
