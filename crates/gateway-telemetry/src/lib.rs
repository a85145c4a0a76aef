//! # Gateway Telemetry
//!
//! Structured logging for the model gateway.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;

// Re-export main types
pub use logging::{filter_for_level, init_logging, LoggingConfig, LoggingError};
