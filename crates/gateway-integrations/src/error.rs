//! Error types for integration adapters.

use gateway_core::GatewayError;
use thiserror::Error;

/// Result type for integration operations
pub type IntegrationResult<T> = Result<T, IntegrationError>;

/// Errors that can occur while augmenting a prompt
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The retrieval service could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The retrieval service did not answer in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The retrieval service answered with an error status
    #[error("Retrieval service returned HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The retrieval service answered with an unexpected body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl IntegrationError {
    /// Classify a transport error from the HTTP client
    pub fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

impl From<IntegrationError> for GatewayError {
    fn from(e: IntegrationError) -> Self {
        match e {
            IntegrationError::Configuration(message) => GatewayError::configuration(message),
            other => GatewayError::prompt(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_gateway_error() {
        let err: GatewayError = IntegrationError::Rejected {
            status: 503,
            body: "index rebuilding".into(),
        }
        .into();
        assert_eq!(
            err,
            GatewayError::prompt("Retrieval service returned HTTP 503: index rebuilding")
        );

        let err: GatewayError = IntegrationError::Configuration("bad endpoint".into()).into();
        assert!(matches!(err, GatewayError::Configuration { .. }));
    }
}
