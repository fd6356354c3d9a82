//! Deterministic mapping from source paths to output paths and URLs.

use std::path::{Component, Path, PathBuf};

use crate::config::{PathsConfig, RenderConfig, SiteConfig};

/// Maps source files onto the output tree.
#[derive(Debug, Clone)]
pub struct OutputMapper {
    /// Directory layout.
    paths: PathsConfig,
    /// Extension mapping.
    render: RenderConfig,
}

impl OutputMapper {
    /// Creates a mapper from explicit sections.
    pub fn new(paths: PathsConfig, render: RenderConfig) -> Self {
        Self { paths, render }
    }

    /// Creates a mapper from the site configuration.
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.paths.clone(), config.render.clone())
    }

    /// Path of `source` relative to the output root.
    ///
    /// `.` and `..` are resolved lexically, then the source root is
    /// stripped and a known source extension is replaced by the output
    /// extension. Paths outside the source root keep their normal components
    /// only, so they can never escape the output root.
    pub fn relative_output(&self, source: &Path) -> PathBuf {
        let source = normalize(source);
        let source_dir = normalize(&self.paths.source_dir);
        let relative = source.strip_prefix(&source_dir).unwrap_or(&source);
        let mut mapped: PathBuf = relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();

        let rewrite = mapped
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.render.is_source_extension(ext));
        if rewrite {
            mapped.set_extension(&self.render.output_extension);
        }
        mapped
    }

    /// Output path for `source`, under the output root.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        self.paths.output_dir.join(self.relative_output(source))
    }

    /// Site-relative URL for `source`, always starting with `/`.
    pub fn url(&self, source: &Path) -> String {
        let parts: Vec<String> = self
            .relative_output(source)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("/{}", parts.join("/"))
    }

    /// The output root.
    pub fn output_dir(&self) -> &Path {
        &self.paths.output_dir
    }

    /// The source root.
    pub fn source_dir(&self) -> &Path {
        &self.paths.source_dir
    }
}

/// Resolves `.` and `..` without touching the filesystem. A `..` with no
/// normal component left to pop is dropped.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
