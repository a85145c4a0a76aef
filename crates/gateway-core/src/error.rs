//! Error types for the gateway.
//!
//! Every failure the gateway can report is a variant of [`GatewayError`].
//! Errors stay typed throughout the crates and are only turned into the
//! client-visible `{"error": "..."}` shape at the HTTP boundary.

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error taxonomy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The model string carried no `<backend>:<model>` separator
    #[error("Invalid model identifier '{model}': expected '<backend>:<model>'")]
    InvalidModelIdentifier {
        /// The raw model string supplied by the client
        model: String,
    },

    /// The backend segment did not match any registered backend
    #[error("Unknown backend '{backend}'")]
    UnknownBackend {
        /// The parsed backend name
        backend: String,
    },

    /// The backend answered with a non-success status or could not be reached
    #[error("Upstream error from backend '{backend}'{}: {body}", format_status(.status))]
    Upstream {
        /// Backend name
        backend: String,
        /// HTTP status returned by the backend, if any response was received
        status: Option<u16>,
        /// Response body or transport error description
        body: String,
    },

    /// The backend did not answer within the configured deadline
    #[error("Backend '{backend}' timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Backend name
        backend: String,
        /// The deadline that elapsed
        timeout: Duration,
    },

    /// The retrieval collaborator failed to produce a prompt
    #[error("Prompt construction failed: {message}")]
    Prompt {
        /// Error message
        message: String,
    },

    /// Malformed client input
    #[error("Validation error: {message}")]
    Validation {
        /// Error message
        message: String,
        /// Offending field, if known
        field: Option<String>,
    },

    /// Invalid configuration detected at construction time
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Unexpected internal failure
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

fn format_status(status: &Option<u16>) -> String {
    status.map_or_else(String::new, |s| format!(" (HTTP {s})"))
}

impl GatewayError {
    /// Create an invalid model identifier error
    pub fn invalid_model(model: impl Into<String>) -> Self {
        Self::InvalidModelIdentifier {
            model: model.into(),
        }
    }

    /// Create an unknown backend error
    pub fn unknown_backend(backend: impl Into<String>) -> Self {
        Self::UnknownBackend {
            backend: backend.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream(backend: impl Into<String>, status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Upstream {
            backend: backend.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(backend: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            backend: backend.into(),
            timeout,
        }
    }

    /// Create a prompt construction error
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status used when this error reaches a client
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidModelIdentifier { .. } | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownBackend { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Prompt { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Configuration { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether a caller could reasonably retry the same request.
    ///
    /// The gateway itself never retries; this is advisory for callers that
    /// want to retry before any streamed byte reached the client.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Upstream { status, .. } => status.map_or(true, |s| s == 429 || s >= 500),
            _ => false,
        }
    }
}
