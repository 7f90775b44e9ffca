//! Error types for Draft.
//!
//! [`DraftError`] covers the failures a handler can run into while producing a
//! response: template rendering, JSON encoding and file access. None of them
//! escape a request; the [`Context`](crate::Context) turns them into a
//! structured error response.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`DraftError`].
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors raised while building a response.
#[derive(Debug, Error)]
pub enum DraftError {
    /// Template lookup or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// A value could not be encoded as JSON.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTML rendering was requested but no templates were loaded.
    #[error("no HTML templates loaded")]
    TemplatesNotLoaded,

    /// A file path was refused by the file system's access rules.
    #[error("forbidden path: {0}")]
    Forbidden(String),

    /// I/O error while reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DraftError {
    /// Returns the HTTP status code that best describes this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            Self::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                StatusCode::FORBIDDEN
            }
            Self::Template(_) | Self::Json(_) | Self::TemplatesNotLoaded | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
