//! Error types for GitHub API operations
//!
//! This module defines error types that can occur when talking to the GitHub
//! REST API, including unsuccessful responses, transport failures, and
//! response bodies of an unexpected shape.

use thiserror::Error;
use tracing::error;

/// How an error came about, independent of which call produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The request could not be completed or the API rejected it
    Connectivity,
    /// The API answered with a value of unexpected shape or type
    MalformedResponse,
}

/// Errors that can occur when calling the GitHub API
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The API answered with a non-success status code
    #[error("GitHub API request failed (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// `message` field of the response body, or the status reason
        message: String,
        /// Response body (JSON when the API sent JSON)
        body: serde_json::Value,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("failed to reach GitHub API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The access token cannot be sent as a header value
    #[error("invalid GitHub access token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// The response body did not deserialize into the expected type
    #[error("unexpected GitHub API response (expected {expected}): {source}")]
    MalformedResponse {
        /// Description of the expected value
        expected: &'static str,
        /// Leading part of the body that was received
        actual: String,
        /// Deserialization failure
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for GitHub API operations
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Classify this error
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            ServiceError::MalformedResponse { .. } => ServiceErrorKind::MalformedResponse,
            ServiceError::Api { .. }
            | ServiceError::Transport(_)
            | ServiceError::InvalidToken(_) => ServiceErrorKind::Connectivity,
        }
    }

    /// Short name of the variant, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ServiceError::Api { .. } => "ApiError",
            ServiceError::Transport(_) => "TransportError",
            ServiceError::InvalidToken(_) => "InvalidToken",
            ServiceError::MalformedResponse { .. } => "MalformedResponse",
        }
    }

    /// HTTP status code, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Api { status, .. } => Some(*status),
            ServiceError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Log everything known about this error for diagnosis
    pub fn log_diagnostics(&self) {
        error!(name = self.name(), message = %self, "GitHub client error");

        match self {
            ServiceError::Api { status, body, .. } => {
                let body = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
                error!(status = *status, "GitHub API response body:\n{}", body);
            }
            ServiceError::Transport(e) => {
                error!(
                    timeout = e.is_timeout(),
                    connect = e.is_connect(),
                    url = e.url().map(|u| u.as_str()).unwrap_or("unknown"),
                    "GitHub API request did not complete"
                );
            }
            ServiceError::MalformedResponse {
                expected,
                actual,
                source,
            } => {
                error!(
                    expected_type = *expected,
                    transformation_error = %source,
                    "GitHub API returned unexpected value: {}",
                    actual
                );
            }
            ServiceError::InvalidToken(_) => {}
        }
    }
}
