//! Server error types.

use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::mime::MimeError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The served root directory cannot be read.
    #[error("Cannot serve {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The listening socket cannot be bound.
    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Content type detection failed for a file with no forced type.
    #[error(transparent)]
    Mime(#[from] MimeError),

    /// The request path does not resolve to a file.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request path escapes the served root or names a non-file.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Root { .. } | Self::Bind { .. } | Self::Mime(_) | Self::Io(_) => {
                tracing::error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let reason = status.canonical_reason().unwrap_or_default();
        (status, format!("{}: {reason}", status.as_u16())).into_response()
    }
}
