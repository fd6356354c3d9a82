//! Convenience result type alias for sitegen.

use crate::error::AppError;

/// A specialized `Result` type for sitegen operations.
pub type AppResult<T> = Result<T, AppError>;
