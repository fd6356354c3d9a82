//! The per-file render loop.
//!
//! For every discovered file, in discovery order:
//!
//! 1. The output path is computed and reserved. A path already reserved by
//!    another source skips the file before any event fires.
//! 2. A fresh [`RenderContext`] goes through `pre_render`, `render`, and
//!    `post_render`. Once a listener sets `skip_file`, no further event
//!    fires for the file.
//! 3. A failing listener ends that file only; the loop moves on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use sitegen_core::types::{DiscoveredFile, OutputMapper, RenderContext};
use sitegen_plugin::EventBus;
use sitegen_plugin::EventPayload;
use sitegen_plugin::events::definitions::{POST_RENDER, PRE_RENDER, RENDER};

use crate::report::{FileFailure, LoopReport, SkipReason, SkippedFile, UNKNOWN_PLUGIN};

/// Where one file's trip through the loop ended.
enum FileOutcome {
    Processed { rendered: bool },
    Skipped(SkipReason),
    Failed(FileFailure),
}

/// Drives the per-file events.
#[derive(Debug)]
pub struct RenderLoop {
    /// Source → output mapping.
    mapper: OutputMapper,
    /// Output path → source file that claimed it. Reset per `process_all`.
    reservations: HashMap<PathBuf, PathBuf>,
}

impl RenderLoop {
    /// Creates a loop for the given output layout.
    pub fn new(mapper: OutputMapper) -> Self {
        Self {
            mapper,
            reservations: HashMap::new(),
        }
    }

    /// Runs every file through the per-file events.
    ///
    /// Never fails: collisions, skips, and listener errors are reported per
    /// file.
    pub fn process_all(&mut self, bus: &EventBus, files: &[DiscoveredFile]) -> LoopReport {
        self.reservations.clear();
        let mut report = LoopReport::default();

        info!(files = files.len(), "Render loop started");

        for file in files {
            match self.process_file(bus, file) {
                FileOutcome::Processed { rendered } => {
                    report.processed += 1;
                    if rendered {
                        report.rendered += 1;
                    } else {
                        report.unrendered += 1;
                    }
                }
                FileOutcome::Skipped(reason) => report.skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason,
                }),
                FileOutcome::Failed(failure) => report.failures.push(failure),
            }
        }

        info!(
            processed = report.processed,
            rendered = report.rendered,
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Render loop finished"
        );
        report
    }

    /// The output path the loop computes for a source file.
    pub fn output_path_for(&self, source: &Path) -> PathBuf {
        self.mapper.output_path(source)
    }

    /// Current reservations: output path → claiming source.
    pub fn reservations(&self) -> &HashMap<PathBuf, PathBuf> {
        &self.reservations
    }

    /// Reserves `output` for `source`, or returns the current claimant.
    fn claim(&mut self, output: &Path, source: &Path) -> Result<(), PathBuf> {
        match self.reservations.get(output) {
            Some(owner) if owner != source => Err(owner.clone()),
            Some(_) => Ok(()),
            None => {
                self.reservations
                    .insert(output.to_path_buf(), source.to_path_buf());
                Ok(())
            }
        }
    }

    fn collision(&mut self, output: &Path, file: &DiscoveredFile) -> Option<SkipReason> {
        let claimed_by = self.claim(output, &file.path).err()?;
        warn!(
            file = %file.path.display(),
            claimed_by = %claimed_by.display(),
            output = %output.display(),
            "Output path already claimed, skipping file"
        );
        Some(SkipReason::Collision {
            output_path: output.to_path_buf(),
            claimed_by,
        })
    }

    fn process_file(&mut self, bus: &EventBus, file: &DiscoveredFile) -> FileOutcome {
        let output = self.mapper.output_path(&file.path);
        if let Some(reason) = self.collision(&output, file) {
            return FileOutcome::Skipped(reason);
        }

        let mut ctx = RenderContext::for_file(file);

        for stage in [PRE_RENDER, RENDER, POST_RENDER] {
            ctx = match fire_stage(bus, stage, ctx) {
                Ok(ctx) => ctx,
                Err(failure) => {
                    warn!(
                        file = %file.path.display(),
                        stage = %failure.stage,
                        plugin_id = %failure.plugin_id,
                        error = %failure.message,
                        "File failed, continuing with next file"
                    );
                    return FileOutcome::Failed(failure);
                }
            };

            if stage == POST_RENDER {
                break;
            }

            if ctx.skip_file {
                info!(file = %file.path.display(), stage = stage, "File skipped by listener");
                return FileOutcome::Skipped(SkipReason::Deferred {
                    stage: stage.to_string(),
                });
            }

            if stage == RENDER {
                let claimed = ctx.output_path.clone().filter(|p| *p != output);
                if let Some(rendered_output) = claimed {
                    if let Some(reason) = self.collision(&rendered_output, file) {
                        return FileOutcome::Skipped(reason);
                    }
                }
            }
        }

        let rendered = ctx.rendered_content.is_some();
        if !rendered {
            debug!(file = %file.path.display(), "No listener rendered this file");
        }
        FileOutcome::Processed { rendered }
    }
}

/// Fires one per-file event and unwraps the render context it returns.
fn fire_stage(bus: &EventBus, stage: &str, ctx: RenderContext) -> Result<RenderContext, FileFailure> {
    let path = ctx.file_path.clone();
    let dispatched = bus
        .dispatch(stage, EventPayload::Render(ctx))
        .map_err(|e| FileFailure {
            path: path.clone(),
            stage: stage.to_string(),
            plugin_id: e.plugin_id,
            message: e.source.to_string(),
        })?;

    let kind = dispatched.payload.kind();
    let replaced_by = dispatched.replaced_by;
    dispatched.payload.into_render().ok_or_else(|| FileFailure {
        path,
        stage: stage.to_string(),
        plugin_id: replaced_by.unwrap_or_else(|| UNKNOWN_PLUGIN.to_string()),
        message: format!("a listener replaced the render context with a '{kind}' payload"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use sitegen_core::SiteConfig;
    use sitegen_plugin::{ClosureListener, FeatureError, Services};

    fn setup() -> (EventBus, RenderLoop) {
        let services = Arc::new(Services::new(SiteConfig::default()));
        let mapper = services.mapper();
        (EventBus::new(services), RenderLoop::new(mapper))
    }

    fn file(path: &str) -> DiscoveredFile {
        DiscoveredFile::new(path, "/")
    }

    fn log_stage(bus: &mut EventBus, stage: &'static str, log: &Arc<Mutex<Vec<String>>>) {
        let log = Arc::clone(log);
        bus.register(
            stage,
            ClosureListener::arc("log", move |payload, _| {
                let ctx = payload.as_render().expect("render payload");
                log.lock()
                    .push(format!("{stage}:{}", ctx.file_path.display()));
                Ok(None)
            }),
        );
    }

    #[test]
    fn test_skip_file_short_circuits() {
        let (mut bus, mut render_loop) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register(
            PRE_RENDER,
            ClosureListener::arc("drafts", |payload, _| {
                let ctx = payload.as_render().cloned().expect("render payload");
                Ok(Some(EventPayload::Render(ctx.skip())))
            }),
        );
        log_stage(&mut bus, RENDER, &log);
        log_stage(&mut bus, POST_RENDER, &log);

        let report = render_loop.process_all(&bus, &[file("content/_tags.md")]);

        assert!(log.lock().is_empty());
        assert_eq!(report.processed, 0);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Deferred {
                stage: PRE_RENDER.to_string()
            }
        );
    }

    #[test]
    fn test_collision_skips_second_claimant() {
        let (mut bus, mut render_loop) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        log_stage(&mut bus, PRE_RENDER, &log);
        log_stage(&mut bus, RENDER, &log);

        let report = render_loop.process_all(
            &bus,
            &[file("content/index.md"), file("content/index.html")],
        );

        assert_eq!(
            *log.lock(),
            vec!["pre_render:content/index.md", "render:content/index.md"]
        );
        assert_eq!(report.processed, 1);
        assert_eq!(report.collisions(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Collision {
                output_path: PathBuf::from("public/index.html"),
                claimed_by: PathBuf::from("content/index.md"),
            }
        );
        assert_eq!(render_loop.reservations().len(), 1);
    }

    #[test]
    fn test_same_file_twice_is_not_a_collision() {
        let (bus, mut render_loop) = setup();
        let report = render_loop.process_all(&bus, &[file("content/a.md"), file("content/a.md")]);
        assert_eq!(report.processed, 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_failing_file_is_isolated() {
        let (mut bus, mut render_loop) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        log_stage(&mut bus, PRE_RENDER, &log);
        bus.register(
            RENDER,
            ClosureListener::arc("renderer", |payload, _| {
                let ctx = payload.as_render().expect("render payload");
                if ctx.file_path.ends_with("2.md") {
                    return Err(FeatureError::listener("template exploded"));
                }
                Ok(None)
            }),
        );
        log_stage(&mut bus, RENDER, &log);
        log_stage(&mut bus, POST_RENDER, &log);

        let report = render_loop.process_all(
            &bus,
            &[file("content/1.md"), file("content/2.md"), file("content/3.md")],
        );

        assert_eq!(
            *log.lock(),
            vec![
                "pre_render:content/1.md",
                "render:content/1.md",
                "post_render:content/1.md",
                "pre_render:content/2.md",
                "pre_render:content/3.md",
                "render:content/3.md",
                "post_render:content/3.md",
            ]
        );
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, RENDER);
        assert_eq!(report.failures[0].plugin_id, "renderer");
    }

    #[test]
    fn test_unrendered_file_is_not_an_error() {
        let (bus, mut render_loop) = setup();
        let report = render_loop.process_all(&bus, &[file("content/a.md")]);
        assert_eq!(report.processed, 1);
        assert_eq!(report.unrendered, 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_rendered_output_path_collision() {
        let (mut bus, mut render_loop) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.register(
            RENDER,
            ClosureListener::arc("renderer", |payload, _| {
                let mut ctx = payload.as_render().cloned().expect("render payload");
                ctx.rendered_content = Some("<p>x</p>".to_string());
                ctx.output_path = Some(PathBuf::from("public/feed.xml"));
                Ok(Some(EventPayload::Render(ctx)))
            }),
        );
        log_stage(&mut bus, POST_RENDER, &log);

        let report = render_loop.process_all(&bus, &[file("content/a.md"), file("content/b.md")]);

        assert_eq!(*log.lock(), vec!["post_render:content/a.md"]);
        assert_eq!(report.rendered, 1);
        assert_eq!(report.collisions(), 1);
    }

    #[test]
    fn test_reservations_reset_per_call() {
        let (bus, mut render_loop) = setup();
        render_loop.process_all(&bus, &[file("content/a.md")]);
        let report = render_loop.process_all(&bus, &[file("content/a.html")]);
        assert_eq!(report.processed, 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_wrong_payload_kind_fails_file() {
        let (mut bus, mut render_loop) = setup();
        bus.register(
            PRE_RENDER,
            ClosureListener::arc("confused", |_, _| Ok(Some(EventPayload::Empty))),
        );
        let report = render_loop.process_all(&bus, &[file("content/a.md")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, PRE_RENDER);
        assert_eq!(report.failures[0].plugin_id, "confused");
    }

    #[test]
    fn test_skip_during_render_suppresses_post_render() {
        let (mut bus, mut render_loop) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        log_stage(&mut bus, PRE_RENDER, &log);
        bus.register(
            RENDER,
            ClosureListener::arc("partials", |payload, _| {
                let mut ctx = payload.as_render().cloned().expect("render payload");
                ctx.rendered_content = Some("<nav/>".to_string());
                Ok(Some(EventPayload::Render(ctx.skip())))
            }),
        );
        log_stage(&mut bus, POST_RENDER, &log);

        let report = render_loop.process_all(&bus, &[file("content/nav.md")]);

        assert_eq!(*log.lock(), vec!["pre_render:content/nav.md"]);
        assert_eq!(report.processed, 0);
        assert_eq!(report.rendered, 0);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Deferred {
                stage: RENDER.to_string()
            }
        );
    }

    #[test]
    fn test_parent_dir_source_does_not_collide_with_sibling() {
        let (bus, mut render_loop) = setup();
        let report = render_loop.process_all(
            &bus,
            &[file("content/a/../b.md"), file("content/a/b.md")],
        );

        assert_eq!(report.processed, 2);
        assert_eq!(report.collisions(), 0);
        assert!(render_loop.reservations().contains_key(Path::new("public/b.html")));
        assert!(render_loop.reservations().contains_key(Path::new("public/a/b.html")));
    }
}
