//! Transport sink abstraction
//!
//! A sink is "a thing bytes can be written to and flushed": the HTTP
//! response body writer or any other byte transport. Each sink is owned by
//! exactly one channel for the duration of a request.

use bytes::Bytes;
use streamgate_core::{Error, Result};
use tokio::sync::mpsc;

/// Outcome of a flush attempt
///
/// Flush capability depends on the transport, so the outcome is tri-state
/// rather than a bool: the channel decides whether an unsupported flush is
/// fatal for its protocol.
#[derive(Debug)]
pub enum FlushOutcome {
    /// Buffered output was handed to the network
    Flushed,

    /// This transport has no flush surface
    Unsupported,

    /// The transport failed while flushing
    Failed(std::io::Error),
}

/// A writable, flushable byte sink backing one stream channel
pub trait EventSink: Send {
    /// Write raw bytes to the transport
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Force buffered output toward the network
    fn flush(&mut self) -> FlushOutcome;

    /// Whether the underlying connection is still open
    fn is_alive(&self) -> bool;

    /// Apply transport-level response metadata (called at most once per
    /// connection, before any event bytes)
    fn apply_headers(&mut self, headers: &[(&str, &str)]) -> Result<()>;
}

/// Sink feeding an HTTP streaming body through an unbounded byte channel
///
/// Each write is handed straight to the body stream, so there is no
/// intermediate buffer and flush reduces to a liveness check.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelSink {
    /// Create a sink and the receiver that becomes the response body
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.tx
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| Error::SinkClosed)
    }

    fn flush(&mut self) -> FlushOutcome {
        if self.tx.is_closed() {
            FlushOutcome::Failed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "response body receiver dropped",
            ))
        } else {
            FlushOutcome::Flushed
        }
    }

    fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    fn apply_headers(&mut self, _headers: &[(&str, &str)]) -> Result<()> {
        // Response headers live on the HTTP response itself, not the body
        // channel; the server applies the same set when assembling it.
        Ok(())
    }
}

/// In-memory capture sink
///
/// Records written bytes, applied headers, and flush count; the flush
/// capability can be switched off to exercise unflushable transports.
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: Vec<u8>,
    headers: Vec<(String, String)>,
    flush_supported: bool,
    flushes: usize,
}

impl BufferSink {
    /// Create a capture sink that supports flush
    pub fn new() -> Self {
        Self {
            flush_supported: true,
            ..Self::default()
        }
    }

    /// Create a capture sink whose transport cannot flush
    pub fn without_flush() -> Self {
        Self::default()
    }

    /// All bytes written so far
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Written bytes as UTF-8, for frame assertions
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf).expect("captured frames are UTF-8")
    }

    /// Headers applied through the sink
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Number of successful flushes
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl EventSink for BufferSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> FlushOutcome {
        if self.flush_supported {
            self.flushes += 1;
            FlushOutcome::Flushed
        } else {
            FlushOutcome::Unsupported
        }
    }

    fn is_alive(&self) -> bool {
        true
    }

    fn apply_headers(&mut self, headers: &[(&str, &str)]) -> Result<()> {
        self.headers.extend(
            headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );
        Ok(())
    }
}
