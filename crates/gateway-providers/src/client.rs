//! Shared outbound HTTP client.

use gateway_core::GatewayError;
use reqwest::Client;
use std::time::Duration;

/// Idle connections kept per backend host
pub const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Build the client shared by the catalog and the dispatcher.
///
/// No overall timeout is set here: each call applies its own deadline, and
/// a streaming body must be allowed to outlive the connect deadline.
///
/// # Errors
/// Returns error if the TLS backend cannot be initialized
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, GatewayError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))
}
