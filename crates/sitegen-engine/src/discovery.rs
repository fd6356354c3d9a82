//! Content discovery: produces the file list the render loop works through.

use std::path::{Path, PathBuf};

use tracing::debug;

use sitegen_core::error::AppError;
use sitegen_core::result::AppResult;
use sitegen_core::types::{DiscoveredFile, OutputMapper};
use sitegen_plugin::Services;

/// Supplies the discovered files of a run.
///
/// Every record needs a non-empty `path` that stays stable for the run.
pub trait Discovery: Send + Sync + std::fmt::Debug {
    /// Lists the content files to render.
    fn discover(&self, services: &Services) -> AppResult<Vec<DiscoveredFile>>;
}

/// Walks `paths.source_dir` recursively.
///
/// Entries whose name starts with `.` are ignored. Files come back sorted
/// by path with empty metadata.
#[derive(Debug, Clone, Default)]
pub struct FsDiscovery;

impl FsDiscovery {
    /// Creates a filesystem discovery.
    pub fn new() -> Self {
        Self
    }

    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> AppResult<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                Self::walk(&path, out)?;
            } else if file_type.is_file() {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl Discovery for FsDiscovery {
    fn discover(&self, services: &Services) -> AppResult<Vec<DiscoveredFile>> {
        let source_dir = &services.config().paths.source_dir;
        if !source_dir.is_dir() {
            return Err(AppError::discovery(format!(
                "Source directory '{}' does not exist",
                source_dir.display()
            )));
        }

        let mut paths = Vec::new();
        Self::walk(source_dir, &mut paths).map_err(|e| {
            AppError::discovery(format!(
                "Failed to scan '{}': {}",
                source_dir.display(),
                e.message
            ))
        })?;
        paths.sort();

        let mapper: OutputMapper = services.mapper();
        let files: Vec<DiscoveredFile> = paths
            .into_iter()
            .map(|path| {
                let url = mapper.url(&path);
                DiscoveredFile::new(path, url)
            })
            .collect();

        debug!(
            source_dir = %source_dir.display(),
            count = files.len(),
            "Discovered content files"
        );
        Ok(files)
    }
}

/// Returns a fixed list, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    /// Files handed out on every call.
    files: Vec<DiscoveredFile>,
}

impl StaticDiscovery {
    /// Creates a discovery returning `files`.
    pub fn new(files: Vec<DiscoveredFile>) -> Self {
        Self { files }
    }
}

impl Discovery for StaticDiscovery {
    fn discover(&self, _services: &Services) -> AppResult<Vec<DiscoveredFile>> {
        Ok(self.files.clone())
    }
}
