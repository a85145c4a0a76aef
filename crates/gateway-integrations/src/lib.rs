//! # Gateway Integrations
//!
//! Adapters that implement the gateway's [`PromptBuilder`] seam:
//! - **Instruction template**: wraps retrieved passages and the user query
//!   in a citation-aware instruction prompt
//! - **Remote retrieval service**: delegates prompt assembly to an external
//!   service over HTTP
//!
//! Retrieval itself (embedding, vector search, index builds) lives outside
//! the gateway; [`ContextSource`] is the boundary.
//!
//! [`PromptBuilder`]: gateway_core::PromptBuilder

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod instruction;
pub mod remote;

// Re-export commonly used types
pub use context::{ContextPassage, ContextSource, StaticContext};
pub use error::{IntegrationError, IntegrationResult};
pub use instruction::InstructionPromptBuilder;
pub use remote::{RemotePromptBuilder, DEFAULT_RETRIEVAL_TIMEOUT};
