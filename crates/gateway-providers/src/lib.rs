//! # Gateway Providers
//!
//! Everything that talks to backends:
//! - The backend registry and its shared snapshot handle
//! - Resolution of `<backend>:<model>` identifiers
//! - Concurrent, failure-tolerant model catalog aggregation
//! - Completion dispatch, buffered or streamed
//! - The line-framed SSE relay used for streaming

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod client;
pub mod dispatcher;
pub mod registry;
pub mod relay;
pub mod resolver;

// Re-export main types
pub use catalog::{models_url, ModelCatalog, DEFAULT_MODELS_TIMEOUT};
pub use client::build_http_client;
pub use dispatcher::{
    CompletionDispatcher, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_STREAM_CONNECT_TIMEOUT,
};
pub use registry::{BackendRegistry, RegistryHandle};
pub use relay::{
    ensure_sentinel, relay_sse, EnsureSentinel, LineBuffer, LineError, MAX_LINE_BYTES,
};
pub use resolver::ModelResolver;
