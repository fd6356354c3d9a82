//! The generator owns the bus, the feature registry, and the render loop,
//! and drives the lifecycle of one run.

use std::sync::Arc;

use tracing::{error, info, warn};

use sitegen_core::SiteConfig;
use sitegen_core::error::AppError;
use sitegen_core::result::AppResult;
use sitegen_core::types::DiscoveredFile;
use sitegen_plugin::events::definitions::{
    CREATE, DESTROY, POST_GLOB, POST_LOOP, PRE_GLOB, PRE_LOOP,
};
use sitegen_plugin::{
    Dispatched, EventBus, EventPayload, Feature, FeatureCatalog, LoadFailure, PluginRegistry,
    Services,
};

use crate::discovery::{Discovery, FsDiscovery};
use crate::render_loop::RenderLoop;
use crate::report::{EventFailure, GenerationReport, UNKNOWN_PLUGIN};

/// Runs one site generation.
///
/// Lifecycle, in order: boot features, `create`, `pre_glob`, discovery,
/// `post_glob`, `pre_loop`, render loop, `post_loop`, `destroy`.
#[derive(Debug)]
pub struct Generator {
    /// Services shared with every feature.
    services: Arc<Services>,
    /// Event bus.
    bus: EventBus,
    /// Loaded features.
    registry: PluginRegistry,
    /// Per-file processor.
    render_loop: RenderLoop,
    /// Supplies the content files.
    discovery: Box<dyn Discovery>,
    /// Compiled-in features installed before the feature directory is scanned.
    builtins: Vec<Arc<dyn Feature>>,
    /// Set once `generate` started.
    booted: bool,
}

impl Generator {
    /// Creates a generator.
    pub fn new(config: SiteConfig, catalog: FeatureCatalog, discovery: Box<dyn Discovery>) -> Self {
        let plugin_root = config.paths.plugin_dir.clone();
        let services = Arc::new(Services::new(config));
        let render_loop = RenderLoop::new(services.mapper());

        Self {
            bus: EventBus::new(Arc::clone(&services)),
            registry: PluginRegistry::new(plugin_root, catalog),
            render_loop,
            discovery,
            builtins: Vec::new(),
            booted: false,
            services,
        }
    }

    /// Creates a generator that walks the configured source directory.
    pub fn from_config(config: SiteConfig, catalog: FeatureCatalog) -> Self {
        Self::new(config, catalog, Box::new(FsDiscovery::new()))
    }

    /// Adds a compiled-in feature, registered ahead of directory features.
    pub fn with_feature(mut self, feature: Arc<dyn Feature>) -> Self {
        self.builtins.push(feature);
        self
    }

    /// Runs the whole lifecycle once.
    ///
    /// Failing features, lifecycle events, discovery, and files are recorded
    /// and the run carries on. Only a fault in the generator itself yields
    /// [`RunOutcome::Failed`](crate::report::RunOutcome::Failed).
    pub fn generate(&mut self) -> GenerationReport {
        let mut report = GenerationReport::start();
        info!(run_id = %report.run_id, "Site generation started");

        if let Err(e) = self.run(&mut report) {
            error!(run_id = %report.run_id, error = %e, "Site generation failed");
            report.fatal = Some(e.to_string());
        }

        report.finish();
        info!(
            run_id = %report.run_id,
            outcome = %report.outcome,
            plugins = report.plugins_loaded.len(),
            files = report.files_discovered,
            rendered = report.render_loop.rendered,
            failures = report.isolated_failures(),
            "Site generation finished"
        );
        report
    }

    fn run(&mut self, report: &mut GenerationReport) -> AppResult<()> {
        self.boot(report)?;

        self.fire_lifecycle(CREATE, EventPayload::Empty, report);
        self.fire_lifecycle(PRE_GLOB, EventPayload::Empty, report);

        let files = self.discover(report);
        report.files_discovered = files.len();

        let files = self.fire_files(POST_GLOB, files, report);
        let files = self.fire_files(PRE_LOOP, files, report);

        report.render_loop = self.render_loop.process_all(&self.bus, &files);

        let summary = serde_json::to_value(&report.render_loop)?;
        self.fire_lifecycle(POST_LOOP, EventPayload::Data(summary), report);
        self.fire_lifecycle(DESTROY, EventPayload::Empty, report);

        Ok(())
    }

    /// Installs compiled-in features, then loads the feature directory.
    fn boot(&mut self, report: &mut GenerationReport) -> AppResult<()> {
        if self.booted {
            return Err(AppError::conflict(
                "Generator already ran; features live for exactly one run",
            ));
        }
        self.booted = true;

        for feature in std::mem::take(&mut self.builtins) {
            let name = feature.name().to_string();
            if let Err(e) = self.registry.add(feature, &mut self.bus, &self.services) {
                warn!(plugin_id = %name, error = %e, "Skipping compiled-in feature");
                report.plugin_failures.push(LoadFailure {
                    plugin: name,
                    reason: e.to_string(),
                });
            }
        }

        let load = self.registry.load_plugins(&mut self.bus, &self.services);
        report.plugins_loaded = load.loaded;
        report.plugins_disabled = load.disabled;
        report.plugin_failures.extend(load.failures);
        Ok(())
    }

    /// Asks the discovery collaborator for files; a failure yields none.
    fn discover(&self, report: &mut GenerationReport) -> Vec<DiscoveredFile> {
        match self.discovery.discover(&self.services) {
            Ok(files) => {
                let (valid, invalid): (Vec<_>, Vec<_>) = files
                    .into_iter()
                    .partition(|f| !f.path.as_os_str().is_empty());
                if !invalid.is_empty() {
                    warn!(count = invalid.len(), "Dropping discovered files without a path");
                    report.files_rejected = invalid.len();
                }
                valid
            }
            Err(e) => {
                warn!(error = %e, "Discovery failed, rendering no files");
                report.discovery_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    /// Fires a whole-run event; a listener failure is recorded, not raised.
    fn fire_lifecycle(
        &self,
        event: &str,
        payload: EventPayload,
        report: &mut GenerationReport,
    ) -> Dispatched {
        match self.bus.dispatch(event, payload) {
            Ok(dispatched) => dispatched,
            Err(e) => {
                warn!(
                    event = %event,
                    plugin_id = %e.plugin_id,
                    error = %e.source,
                    "Lifecycle event failed, continuing with next phase"
                );
                report.event_failures.push(EventFailure {
                    event: e.event,
                    plugin_id: e.plugin_id,
                    message: e.source.to_string(),
                });
                Dispatched {
                    payload: e.payload,
                    replaced_by: e.replaced_by,
                }
            }
        }
    }

    /// Fires an event carrying the file list and returns the list listeners
    /// left behind.
    fn fire_files(
        &self,
        event: &str,
        files: Vec<DiscoveredFile>,
        report: &mut GenerationReport,
    ) -> Vec<DiscoveredFile> {
        let original = files.clone();
        let dispatched = self.fire_lifecycle(event, EventPayload::Files(files), report);
        match dispatched.payload {
            EventPayload::Files(files) => files,
            other => {
                let plugin_id = dispatched
                    .replaced_by
                    .unwrap_or_else(|| UNKNOWN_PLUGIN.to_string());
                warn!(
                    event = %event,
                    plugin_id = %plugin_id,
                    payload = other.kind(),
                    "File list replaced by another payload kind, keeping the original list"
                );
                report.event_failures.push(EventFailure {
                    event: event.to_string(),
                    plugin_id,
                    message: format!("expected a file list, got a '{}' payload", other.kind()),
                });
                original
            }
        }
    }

    /// Services shared with features.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// The event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The feature registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }
}
