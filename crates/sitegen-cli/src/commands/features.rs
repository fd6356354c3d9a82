//! Feature listing command.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use sitegen_core::SiteConfig;
use sitegen_core::error::AppError;
use sitegen_features::builtin_catalog;
use sitegen_plugin::{FeatureCatalog, FeatureManifest};

/// A feature the build can run.
#[derive(Debug, Serialize, Tabled)]
struct FeatureRow {
    /// Feature name
    name: String,
    /// Catalog entry point
    entry: String,
    /// Where the feature comes from
    origin: String,
    /// Load status
    status: String,
    /// Events listened to
    events: String,
}

/// Execute the features command
pub fn execute(config: &SiteConfig, format: OutputFormat) -> Result<(), AppError> {
    let catalog = builtin_catalog();
    let mut rows = catalog_rows(&catalog);
    rows.extend(directory_rows(&config.paths.plugin_dir, &catalog)?);

    if format == OutputFormat::Table {
        output::print_kv("Feature directory", &config.paths.plugin_dir.display().to_string());
    }
    output::print_list(&rows, format);
    Ok(())
}

fn catalog_rows(catalog: &FeatureCatalog) -> Vec<FeatureRow> {
    catalog
        .entries()
        .into_iter()
        .map(|entry| {
            let manifest = FeatureManifest::inline(entry, entry);
            describe(&manifest, catalog, "builtin")
        })
        .collect()
}

fn directory_rows(root: &Path, catalog: &FeatureCatalog) -> Result<Vec<FeatureRow>, AppError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs: Vec<_> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    Ok(dirs
        .iter()
        .map(|dir| match FeatureManifest::load(dir) {
            Ok(manifest) if !manifest.enabled => FeatureRow {
                name: manifest.name,
                entry: manifest.entry,
                origin: dir.display().to_string(),
                status: "disabled".to_string(),
                events: String::new(),
            },
            Ok(manifest) => describe(&manifest, catalog, &dir.display().to_string()),
            Err(e) => FeatureRow {
                name: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                entry: "-".to_string(),
                origin: dir.display().to_string(),
                status: format!("error: {e}"),
                events: String::new(),
            },
        })
        .collect())
}

fn describe(manifest: &FeatureManifest, catalog: &FeatureCatalog, origin: &str) -> FeatureRow {
    let (status, events) = match catalog.resolve(manifest) {
        Ok(feature) => ("ok".to_string(), feature.event_listeners().join(", ")),
        Err(e) => (format!("error: {e}"), String::new()),
    };
    FeatureRow {
        name: manifest.name.clone(),
        entry: manifest.entry.clone(),
        origin: origin.to_string(),
        status,
        events,
    }
}
