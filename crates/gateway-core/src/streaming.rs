//! Server-sent event chunks relayed from a backend.
//!
//! A chunk is one SSE line (`data: <payload>`) passed through without
//! looking inside the payload.

use futures::stream::BoxStream;
use std::fmt;

/// Prefix every relayed SSE line carries
pub const DATA_PREFIX: &str = "data: ";

/// Terminal sentinel line
pub const DONE_SENTINEL: &str = "data: [DONE]";

/// Lazily produced sequence of relayed chunks
pub type ChunkStream = BoxStream<'static, StreamChunk>;

/// One relayed `data: ` line, without its trailing newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk(String);

impl StreamChunk {
    /// Wrap a raw line when it is an SSE data line.
    ///
    /// Returns `None` for comments, blank separators and other fields.
    pub fn from_line(line: &str) -> Option<Self> {
        line.starts_with(DATA_PREFIX).then(|| Self(line.to_string()))
    }

    /// The synthetic terminal chunk
    #[must_use]
    pub fn done() -> Self {
        Self(DONE_SENTINEL.to_string())
    }

    /// Whether this chunk is the terminal sentinel
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.0.trim() == DONE_SENTINEL
    }

    /// The full line
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire frame for the client: the line followed by a blank line
    #[must_use]
    pub fn to_frame(&self) -> String {
        format!("{}\n\n", self.0)
    }
}

impl fmt::Display for StreamChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_data_lines_are_chunks() {
        assert!(StreamChunk::from_line("data: {\"id\":1}").is_some());
        assert!(StreamChunk::from_line(": keep-alive").is_none());
        assert!(StreamChunk::from_line("").is_none());
        assert!(StreamChunk::from_line("event: ping").is_none());
        assert!(StreamChunk::from_line("data:no-space").is_none());
    }

    #[test]
    fn test_done_detection_trims() {
        assert!(StreamChunk::from_line("data: [DONE]  ").unwrap().is_done());
        assert!(StreamChunk::done().is_done());
        assert!(!StreamChunk::from_line("data: [DONE]x").unwrap().is_done());
    }

    #[test]
    fn test_frame() {
        let chunk = StreamChunk::from_line("data: {\"a\":1}").unwrap();
        assert_eq!(chunk.to_frame(), "data: {\"a\":1}\n\n");
        assert_eq!(StreamChunk::done().to_frame(), "data: [DONE]\n\n");
    }
}
