//! Error taxonomy for the todo backend core.
//!
//! Operations return an explicit error kind rather than relying on thrown
//! status codes; the handler layer maps kinds to transport status codes.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, TodoError>;

/// Errors surfaced by the core operations (list, search, CRUD).
///
/// Per-record indexing failures never appear here; they are contained
/// inside the propagator batch and reported via its batch outcome.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Missing or malformed input: bad cursor, empty required field,
    /// non-positive limit.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced item does not exist for the calling user.
    #[error("todo not found: {todo_id}")]
    NotFound { todo_id: String },

    /// Caller identity could not be verified.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A primary- or secondary-store call failed. The message is generic;
    /// store detail is logged at the failure site, never surfaced.
    #[error("storage operation failed: {0}")]
    Storage(String),

    /// Catch-all for conditions that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable error kinds for handler-layer status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Storage,
    Internal,
}

impl ErrorKind {
    /// Stable name for structured error payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Storage => "storage",
            ErrorKind::Internal => "internal",
        }
    }
}

impl TodoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TodoError::Validation(_) => ErrorKind::Validation,
            TodoError::NotFound { .. } => ErrorKind::NotFound,
            TodoError::Unauthorized(_) => ErrorKind::Unauthorized,
            TodoError::Storage(_) => ErrorKind::Storage,
            TodoError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(
            TodoError::Validation("x".into()).kind().as_str(),
            "validation"
        );
        assert_eq!(
            TodoError::NotFound {
                todo_id: "t".into()
            }
            .kind()
            .as_str(),
            "not_found"
        );
        assert_eq!(TodoError::Storage("x".into()).kind().as_str(), "storage");
    }
}
