//! Errors raised by features and the feature framework.

use std::path::PathBuf;

use thiserror::Error;

use sitegen_core::error::AppError;

/// Error returned by feature listeners, registration, and loading.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A listener failed while handling an event.
    #[error("listener failed: {0}")]
    Listener(String),
    /// A feature could not register its listeners.
    #[error("registration failed: {0}")]
    Registration(String),
    /// The feature directory has no entry-point manifest.
    #[error("no feature.toml in '{}'", .0.display())]
    MissingEntryPoint(PathBuf),
    /// The manifest exists but cannot be read or is malformed.
    #[error("invalid manifest '{}': {message}", path.display())]
    Manifest {
        /// Path of the manifest.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
    /// The manifest names an entry the catalog does not know.
    #[error("unknown entry point '{0}'")]
    UnknownEntry(String),
    /// A feature with the same name is already loaded.
    #[error("feature '{0}' is already registered")]
    Duplicate(String),
    /// An I/O operation inside a feature failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An application error surfaced inside a feature.
    #[error(transparent)]
    App(#[from] AppError),
}

impl FeatureError {
    /// Creates a listener error from any message.
    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener(message.into())
    }

    /// Creates a registration error from any message.
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration(message.into())
    }
}

impl From<FeatureError> for AppError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::App(app) => app,
            other => AppError::plugin(other.to_string()),
        }
    }
}
