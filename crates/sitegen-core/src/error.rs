//! Error type shared by every sitegen crate.
//!
//! Feature code has its own `FeatureError`; everything the engine, the
//! configuration layer, and the CLI report is an [`AppError`].

use std::fmt;
use thiserror::Error;

/// What went wrong, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A value was rejected (configuration values, manifest fields).
    Validation,
    /// Two things claim the same slot, or an operation ran twice.
    Conflict,
    /// A filesystem operation failed.
    Io,
    /// The configuration sources could not be read or merged.
    Configuration,
    /// The discovery collaborator could not list the content files.
    Discovery,
    /// A feature failed outside of a listener call.
    Plugin,
    /// A value could not be converted to or from JSON.
    Serialization,
}

impl ErrorKind {
    /// Stable upper-case code used in messages and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Io => "IO",
            Self::Configuration => "CONFIGURATION",
            Self::Discovery => "DISCOVERY",
            Self::Plugin => "PLUGIN",
            Self::Serialization => "SERIALIZATION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// An error with a kind, a message, and optionally the error that caused it.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Underlying cause.
    #[source]
    pub source: Option<BoxedSource>,
}

impl AppError {
    /// Creates an error without a cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping its cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A rejected value.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// A conflicting claim or repeated operation.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Unreadable or unmergeable configuration.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Discovery could not list files.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Discovery, message)
    }

    /// A feature failed outside of a listener call.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Plugin, message)
    }
}

// The boxed source is not `Clone`; clones keep kind and message only.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        Self::with_source(ErrorKind::Io, message, err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        let message = format!("invalid JSON: {err}");
        Self::with_source(ErrorKind::Serialization, message, err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        let message = err.to_string();
        Self::with_source(ErrorKind::Configuration, message, err)
    }
}
