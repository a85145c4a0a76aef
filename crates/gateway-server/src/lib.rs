//! # Gateway Server
//!
//! HTTP surface of the model gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server with graceful shutdown
//! - OpenAI-compatible `/v1/chat/completions` and `/v1/models`
//! - Prompt augmentation before dispatch
//! - Request id propagation and request tracing
//! - Liveness and readiness probes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use routes::create_router;
pub use server::{shutdown_signal, Server, ServerConfig, ServerError};
pub use state::{AppState, AppStateBuilder};
