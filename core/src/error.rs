//! Error types for the console gateways.
//!
//! # Design
//! `InvalidJsonBody` is a caller mistake and is raised before any request is
//! built. `Http` carries the status and the decoded body so callers can tell
//! a 401 (go to login) from a 404 (try a fallback endpoint) from anything
//! else. `Transport` covers DNS, connect and read failures and is never
//! retried here.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A pre-serialized text body was not valid JSON.
    #[error("request body is not valid JSON: {0}")]
    InvalidJsonBody(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        message: String,
        status: u16,
        data: Value,
    },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A path parameter cannot be expressed as a single URL segment.
    #[error("invalid path segment: {0:?}")]
    InvalidPathSegment(String),

    /// A structured body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded response body for `Http` errors.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Http { data, .. } => Some(data),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
