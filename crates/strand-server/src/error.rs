//! Request-level error taxonomy, mapped onto HTTP statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Terminal failure states a request can reach. Each maps to exactly one
/// HTTP status; none are retried.
#[derive(Debug, Error)]
pub enum ServeError {
    /// A route referenced a workspace id with no registered root.
    #[error("unknown workspace '{0}'")]
    UnknownWorkspace(String),

    /// Static resolution exhausted every candidate root.
    #[error("'{0}' not found in any search path")]
    NotFound(String),

    /// The requested path tried to escape its candidate roots.
    #[error("refusing path '{0}'")]
    Forbidden(String),

    /// A program other than the pinned one was requested.
    #[error("server is pinned to '{pinned}', refusing '{requested}'")]
    Pinned { pinned: String, requested: String },

    /// The HTML shell template could not be read.
    #[error("failed to read shell template: {0}")]
    Template(#[source] std::io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownWorkspace(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Pinned { .. } => StatusCode::UNAUTHORIZED,
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
