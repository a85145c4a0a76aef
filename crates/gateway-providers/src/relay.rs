//! Line-framed SSE relay.
//!
//! [`relay_sse`] turns a backend response body into a lazy sequence of
//! `data: ` lines. It forwards data lines in arrival order, drops comments
//! and blank separators, and ends right after the backend's own
//! `data: [DONE]`. [`ensure_sentinel`] guarantees the consumer sees a
//! sentinel even when the backend hangs up without one.
//!
//! Dropping either stream drops the response body, which closes the
//! upstream connection.

use async_stream::stream;
use bytes::Bytes;
use futures::stream::Stream;
use futures_util::StreamExt;
use gateway_core::StreamChunk;
use pin_project_lite::pin_project;
use std::fmt::Display;
use std::pin::Pin;
use std::string::FromUtf8Error;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

/// Longest line the relay will buffer before giving up on a backend
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// A line that could not be cut from the buffer
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    /// The line is not valid UTF-8
    #[error("line is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// No line ending within the size limit
    #[error("line exceeds {limit} bytes without a line ending")]
    TooLong {
        /// Configured maximum line length
        limit: usize,
    },
}

/// Accumulates raw bytes and hands out complete lines.
///
/// `\n`, `\r\n` and a bare `\r` all end a line.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    scanned: usize,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    /// Buffer that rejects lines longer than `max_line` bytes
    #[must_use]
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_line,
        }
    }

    /// Append bytes read from the network
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete line without its terminator.
    ///
    /// Returns `None` until a full line is buffered. A `\r` that ends the
    /// buffered bytes is held back until the next byte shows whether it
    /// starts a `\r\n`.
    pub fn next_line(&mut self) -> Option<Result<String, LineError>> {
        let found = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map(|offset| self.scanned + offset);

        let Some(pos) = found else {
            self.scanned = self.buf.len();
            if self.buf.len() > self.max_line {
                return Some(Err(LineError::TooLong { limit: self.max_line }));
            }
            return None;
        };

        let consumed = if self.buf[pos] == b'\n' {
            pos + 1
        } else {
            match self.buf.get(pos + 1) {
                Some(b'\n') => pos + 2,
                Some(_) => pos + 1,
                None => {
                    self.scanned = pos;
                    return None;
                }
            }
        };

        let mut line: Vec<u8> = self.buf.drain(..consumed).collect();
        line.truncate(pos);
        self.scanned = 0;
        Some(String::from_utf8(line).map_err(LineError::from))
    }

    /// Whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<Result<String, LineError>> {
        self.scanned = 0;
        if self.buf.is_empty() {
            return None;
        }
        let mut rest = std::mem::take(&mut self.buf);
        if rest.last() == Some(&b'\r') {
            rest.pop();
        }
        Some(String::from_utf8(rest).map_err(LineError::from))
    }
}

/// Relay the `data: ` lines of an SSE body.
///
/// The stream ends after the backend's sentinel, when the body ends, on a
/// transport error or on a line that is not valid UTF-8 or too long to
/// buffer. Nothing already
/// forwarded is ever repeated.
pub fn relay_sse<S, E>(backend: String, body: S) -> impl Stream<Item = StreamChunk> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    stream! {
        let mut body = Box::pin(body);
        let mut lines = LineBuffer::default();
        let mut forwarded: usize = 0;

        'read: loop {
            match body.next().await {
                Some(Ok(bytes)) => {
                    lines.extend(&bytes);
                    while let Some(line) = lines.next_line() {
                        let line = match line {
                            Ok(line) => line,
                            Err(e) => {
                                warn!(backend = %backend, forwarded, error = %e, "Malformed stream line, stopping relay");
                                break 'read;
                            }
                        };
                        trace!(backend = %backend, line = %line, "Stream line");

                        if let Some(chunk) = StreamChunk::from_line(&line) {
                            let done = chunk.is_done();
                            forwarded += 1;
                            yield chunk;
                            if done {
                                debug!(backend = %backend, forwarded, "Backend sent stream sentinel");
                                break 'read;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(backend = %backend, forwarded, error = %e, "Stream read failed, stopping relay");
                    break 'read;
                }
                None => {
                    if let Some(Ok(line)) = lines.finish() {
                        if let Some(chunk) = StreamChunk::from_line(&line) {
                            forwarded += 1;
                            yield chunk;
                        }
                    }
                    debug!(backend = %backend, forwarded, "Backend closed stream");
                    break 'read;
                }
            }
        }
    }
}

pin_project! {
    /// Appends `data: [DONE]` if the inner stream ends without one
    pub struct EnsureSentinel<S> {
        #[pin]
        inner: S,
        saw_sentinel: bool,
        finished: bool,
    }
}

/// Guarantee that `stream` terminates with a sentinel chunk
pub fn ensure_sentinel<S>(stream: S) -> EnsureSentinel<S>
where
    S: Stream<Item = StreamChunk>,
{
    EnsureSentinel {
        inner: stream,
        saw_sentinel: false,
        finished: false,
    }
}

impl<S> Stream for EnsureSentinel<S>
where
    S: Stream<Item = StreamChunk>,
{
    type Item = StreamChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(chunk)) => {
                if chunk.is_done() {
                    *this.saw_sentinel = true;
                    *this.finished = true;
                }
                Poll::Ready(Some(chunk))
            }
            Poll::Ready(None) => {
                *this.finished = true;
                if *this.saw_sentinel {
                    Poll::Ready(None)
                } else {
                    debug!("Stream ended without sentinel, appending one");
                    *this.saw_sentinel = true;
                    Poll::Ready(Some(StreamChunk::done()))
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io;

    fn body(parts: &[&str]) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
        let parts: Vec<Result<Bytes, io::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        stream::iter(parts)
    }

    async fn collect_lines<S: Stream<Item = StreamChunk>>(s: S) -> Vec<String> {
        s.map(|c| c.as_str().to_string()).collect().await
    }

    #[test]
    fn test_line_buffer_handles_crlf_and_partial_lines() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"data: a\r\ndata: ");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: a");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"b\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: b");
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_line_buffer_splits_on_bare_cr() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"data: a\r\rdata: b\r");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: a");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"\ndata: c\r");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: b");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.finish().unwrap().unwrap(), "data: c");
    }

    #[test]
    fn test_line_buffer_rejects_overlong_line() {
        let mut buffer = LineBuffer::with_max_line(8);
        buffer.extend(b"data: ");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"0123456789");
        assert!(matches!(
            buffer.next_line(),
            Some(Err(LineError::TooLong { limit: 8 }))
        ));
    }

    #[test]
    fn test_line_buffer_joins_split_utf8() {
        let mut buffer = LineBuffer::default();
        let bytes = "data: 你好\n".as_bytes();
        buffer.extend(&bytes[..8]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[8..]);
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: 你好");
    }

    #[tokio::test]
    async fn test_relay_filters_and_stops_at_sentinel() {
        let relay = relay_sse(
            "test".into(),
            body(&["data: a\n: comment\n\ndata: b\n", "data: [DONE]\n\ndata: late\n"]),
        );

        assert_eq!(
            collect_lines(relay).await,
            vec!["data: a", "data: b", "data: [DONE]"]
        );
    }

    #[tokio::test]
    async fn test_relay_stops_at_sentinel_with_cr_line_endings() {
        let relay = relay_sse("test".into(), body(&["data: a\r\rdata: [DONE]\r\rdata: late\r\r"]));
        assert_eq!(collect_lines(relay).await, vec!["data: a", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_relay_cr_split_from_lf_across_reads() {
        let relay = relay_sse("test".into(), body(&["data: a\r", "\ndata: b\r", "\n"]));
        assert_eq!(collect_lines(relay).await, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn test_relay_stops_on_line_without_ending() {
        let endless = stream::iter(std::iter::repeat_with(|| {
            Ok::<_, io::Error>(Bytes::from(vec![b'x'; 64 * 1024]))
        }));
        let parts = stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(b"data: a\n"))]).chain(endless);
        let relay = relay_sse("test".into(), parts);

        assert_eq!(collect_lines(relay).await, vec!["data: a"]);
    }

    #[tokio::test]
    async fn test_relay_reassembles_lines_across_chunks() {
        let relay = relay_sse("test".into(), body(&["da", "ta: {\"x\"", ":1}\n", "data: [DO", "NE]\n"]));

        assert_eq!(
            collect_lines(relay).await,
            vec!["data: {\"x\":1}", "data: [DONE]"]
        );
    }

    #[tokio::test]
    async fn test_relay_forwards_trailing_line_without_newline() {
        let relay = relay_sse("test".into(), body(&["data: a\ndata: b"]));
        assert_eq!(collect_lines(relay).await, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn test_relay_stops_on_transport_error() {
        let parts: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"data: a\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"data: b\n")),
        ];
        let relay = relay_sse("test".into(), stream::iter(parts));

        assert_eq!(collect_lines(relay).await, vec!["data: a"]);
    }

    #[tokio::test]
    async fn test_relay_stops_on_invalid_utf8() {
        let parts: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"data: a\n")),
            Ok(Bytes::from_static(b"data: \xff\xfe\n")),
            Ok(Bytes::from_static(b"data: b\n")),
        ];
        let relay = relay_sse("test".into(), stream::iter(parts));

        assert_eq!(collect_lines(relay).await, vec!["data: a"]);
    }

    #[tokio::test]
    async fn test_ensure_sentinel_synthesizes_done() {
        let relay = ensure_sentinel(relay_sse("test".into(), body(&["data: a\n"])));
        assert_eq!(collect_lines(relay).await, vec!["data: a", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_ensure_sentinel_does_not_duplicate_done() {
        let relay = ensure_sentinel(relay_sse("test".into(), body(&["data: a\ndata: [DONE]\n"])));
        assert_eq!(collect_lines(relay).await, vec!["data: a", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_ensure_sentinel_on_empty_stream() {
        let relay = ensure_sentinel(stream::empty::<StreamChunk>());
        assert_eq!(collect_lines(relay).await, vec!["data: [DONE]"]);
    }
}
