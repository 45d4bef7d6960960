//! # Engine Errors
//!
//! Errors surfaced by [`Engine`](crate::framework::Engine) operations. The HTTP
//! status category is kept in the variant so callers can branch on it instead
//! of treating every failure as "not found".

use reqwest::StatusCode;

/// Errors that can occur while talking to a REST collection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },
    #[error("Unauthorized ({status})")]
    Unauthorized { status: u16 },
    #[error("Request rejected ({status})")]
    Rejected { status: u16 },
    #[error("Server error ({status})")]
    ServerError { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Identifier must be a non-empty path segment other than `.` or `..`")]
    InvalidId,
}

impl EngineError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: StatusCode, resource: impl Into<String>) -> Self {
        match status {
            StatusCode::NOT_FOUND => EngineError::NotFound {
                resource: resource.into(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EngineError::Unauthorized {
                status: status.as_u16(),
            },
            s if s.is_server_error() => EngineError::ServerError {
                status: s.as_u16(),
            },
            s => EngineError::Rejected { status: s.as_u16() },
        }
    }

    /// The HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            EngineError::NotFound { .. } => Some(StatusCode::NOT_FOUND.as_u16()),
            EngineError::Unauthorized { status }
            | EngineError::Rejected { status }
            | EngineError::ServerError { status } => Some(*status),
            EngineError::Network(_) | EngineError::Decode(_) | EngineError::InvalidId => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            EngineError::Decode(e.to_string())
        } else {
            EngineError::Network(e.to_string())
        }
    }
}
