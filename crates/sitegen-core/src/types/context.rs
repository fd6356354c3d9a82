//! The per-file render context.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::file::{DiscoveredFile, Metadata};

/// Mutable record threaded through `pre_render`, `render`, and `post_render`
/// for a single file.
///
/// A fresh context is built for every file; nothing in it survives to the
/// next file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    /// Source file being rendered.
    pub file_path: PathBuf,
    /// URL assigned by discovery.
    pub url: String,
    /// Metadata supplied by discovery.
    pub source_metadata: Metadata,
    /// Output produced by a rendering feature.
    pub rendered_content: Option<String>,
    /// Metadata accumulated by listeners during this file's events.
    pub metadata: Metadata,
    /// Where the rendered output goes, set by a rendering feature.
    pub output_path: Option<PathBuf>,
    /// Once set, no further per-file events fire for this file.
    pub skip_file: bool,
}

impl RenderContext {
    /// Builds the initial context for a discovered file.
    pub fn for_file(file: &DiscoveredFile) -> Self {
        Self {
            file_path: file.path.clone(),
            url: file.url.clone(),
            source_metadata: file.metadata.clone(),
            rendered_content: None,
            metadata: Metadata::new(),
            output_path: None,
            skip_file: false,
        }
    }

    /// Marks the file as skipped.
    pub fn skip(mut self) -> Self {
        self.skip_file = true;
        self
    }

    /// Sets a metadata value.
    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Returns the source file name, if it has one.
    pub fn file_name(&self) -> Option<&str> {
        self.file_path.file_name().and_then(|n| n.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context() {
        let file = DiscoveredFile::new("content/a.md", "/a.html")
            .with_meta("draft", serde_json::json!(true));
        let ctx = RenderContext::for_file(&file);

        assert_eq!(ctx.file_path, PathBuf::from("content/a.md"));
        assert!(ctx.metadata.is_empty());
        assert!(ctx.rendered_content.is_none());
        assert!(ctx.output_path.is_none());
        assert!(!ctx.skip_file);
        assert_eq!(ctx.source_metadata.get("draft"), Some(&serde_json::json!(true)));
        assert_eq!(ctx.file_name(), Some("a.md"));
    }
}
