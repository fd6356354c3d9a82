//! Site identity configuration.

use serde::{Deserialize, Serialize};

/// The `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Human-readable site title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Absolute URL the site is served from, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            base_url: default_base_url(),
        }
    }
}

impl SiteSection {
    /// Joins a site-relative URL onto the base URL.
    pub fn absolute_url(&self, url: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}
