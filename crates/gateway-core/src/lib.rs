//! # Gateway Core
//!
//! Core types, errors and collaborator traits for the model gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Chat messages and completion requests
//! - Namespaced model references
//! - Model catalog entries
//! - The gateway error taxonomy
//! - The prompt builder seam used for retrieval augmentation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod prompt;
pub mod request;
pub mod response;
pub mod streaming;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult};
pub use model::{ModelReference, MODEL_SEPARATOR};
pub use prompt::{PromptBuilder, StaticPromptBuilder};
pub use request::{
    ChatMessage, CompletionRequest, CompletionRequestBuilder, MessageRole, DEFAULT_TEMPERATURE,
    validate_temperature,
};
pub use response::{ModelCatalogEntry, ModelsResponse, DEFAULT_MODEL_CREATED};
pub use streaming::{ChunkStream, StreamChunk, DATA_PREFIX, DONE_SENTINEL};
