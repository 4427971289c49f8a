//! Per-request SSE stream channel
//!
//! Owns one sink plus the `headers_sent`/`terminated` flags, and enforces
//! the delivery guarantees: every event is flushed as soon as it is
//! written, headers are initialized exactly once, and the termination
//! sentinel goes out at most once. Driven by a single request-handling
//! flow; concurrent writers are a caller contract violation, so no
//! internal locking exists.

use serde::Serialize;
use streamgate_core::{Error, LogicalEvent, Result};
use tracing::error;

use crate::sink::{EventSink, FlushOutcome};

/// Response metadata keeping the connection open as an incremental
/// event stream: no caching, no intermediary buffering, chunked keep-alive
pub const EVENT_STREAM_HEADERS: [(&str, &str); 5] = [
    ("content-type", "text/event-stream"),
    ("cache-control", "no-cache"),
    ("connection", "keep-alive"),
    ("transfer-encoding", "chunked"),
    ("x-accel-buffering", "no"),
];

/// Stateful channel binding a sink to the event-stream protocol
///
/// Lifecycle: `Idle -> HeadersSent -> Streaming* -> Terminated`, where
/// `Terminated` is absorbing.
#[derive(Debug)]
pub struct StreamChannel<S: EventSink> {
    sink: S,
    headers_sent: bool,
    terminated: bool,
}

impl<S: EventSink> StreamChannel<S> {
    /// Bind a fresh channel to a sink
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            headers_sent: false,
            terminated: false,
        }
    }

    /// Whether the termination sentinel has been delivered
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Whether the underlying transport is still open
    pub fn is_alive(&self) -> bool {
        self.sink.is_alive()
    }

    /// Borrow the underlying sink (for capture/inspection)
    pub fn sink_ref(&self) -> &S {
        &self.sink
    }

    /// Set the event-stream response metadata; no-op after the first call
    pub fn ensure_headers(&mut self) -> Result<()> {
        if self.headers_sent {
            return Ok(());
        }
        self.sink.apply_headers(&EVENT_STREAM_HEADERS)?;
        self.headers_sent = true;
        Ok(())
    }

    /// Write a named event with a JSON-serialized payload and flush
    ///
    /// The write is best-effort: a payload that cannot serialize is logged
    /// and dropped without killing the stream. The flush is not; a sink
    /// that cannot flush fails the call.
    pub fn send_typed<T: Serialize>(&mut self, name: &str, payload: &T) -> Result<()> {
        self.pre_send()?;
        match serde_json::to_string(payload) {
            Ok(json) => {
                self.sink
                    .write(LogicalEvent::typed(name, json).frame().as_bytes())?;
                metrics::counter!("streamgate_frames_total", "kind" => "typed").increment(1);
            }
            Err(e) => error!("error serializing stream event payload: {e}"),
        }
        self.flush()
    }

    /// Write a named event with a pre-serialized payload and flush
    ///
    /// Framed across two writes (event-name line, then data line plus
    /// terminator) for callers that produce the name and data separately;
    /// the resulting bytes are identical to [`send_typed`](Self::send_typed).
    pub fn send_typed_raw(&mut self, name: &str, payload: &str) -> Result<()> {
        self.pre_send()?;
        self.sink.write(format!("event: {name}\n").as_bytes())?;
        self.sink.write(format!("data: {payload}\n\n").as_bytes())?;
        metrics::counter!("streamgate_frames_total", "kind" => "typed").increment(1);
        self.flush()
    }

    /// Write one plain data event and flush
    ///
    /// A redundant leading `data: ` prefix and trailing line breaks are
    /// stripped before framing, so upstream double-framing cannot corrupt
    /// the stream.
    pub fn send_data(&mut self, raw: &str) -> Result<()> {
        self.pre_send()?;
        self.sink.write(LogicalEvent::data(raw).frame().as_bytes())?;
        metrics::counter!("streamgate_frames_total", "kind" => "data").increment(1);
        self.flush()
    }

    /// Write a comment-style keep-alive frame and flush
    pub fn send_ping(&mut self) -> Result<()> {
        self.pre_send()?;
        self.sink.write(LogicalEvent::Ping.frame().as_bytes())?;
        metrics::counter!("streamgate_frames_total", "kind" => "ping").increment(1);
        self.flush()
    }

    /// Serialize `value` and deliver it as a data event
    ///
    /// Rejects an absent value before touching the sink.
    pub fn send_object<T: Serialize>(&mut self, value: Option<&T>) -> Result<()> {
        let value = value.ok_or(Error::NullPayload)?;
        let json = serde_json::to_string(value)?;
        self.send_data(&json)
    }

    /// Deliver the `[DONE]` sentinel and close out the channel
    ///
    /// Idempotent: a second call is a no-op. The terminated flag is set
    /// before the write, so the stream can never carry two sentinels even
    /// if the first delivery fails mid-way.
    pub fn terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        self.ensure_headers()?;
        self.sink.write(LogicalEvent::Done.frame().as_bytes())?;
        metrics::counter!("streamgate_frames_total", "kind" => "done").increment(1);
        self.flush()
    }

    fn pre_send(&mut self) -> Result<()> {
        if self.terminated {
            return Err(Error::Terminated);
        }
        self.ensure_headers()
    }

    fn flush(&mut self) -> Result<()> {
        match self.sink.flush() {
            FlushOutcome::Flushed => Ok(()),
            FlushOutcome::Unsupported => Err(Error::Unflushable),
            FlushOutcome::Failed(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use serde_json::json;

    fn channel() -> StreamChannel<BufferSink> {
        StreamChannel::new(BufferSink::new())
    }

    #[test]
    fn test_typed_event_framing() {
        let mut ch = channel();
        ch.send_typed("message_start", &json!({"id": "msg_1"})).unwrap();
        assert_eq!(
            ch.sink.as_str(),
            "event: message_start\ndata: {\"id\":\"msg_1\"}\n\n"
        );
        assert_eq!(ch.sink.flush_count(), 1);
    }

    #[test]
    fn test_typed_raw_matches_typed_framing() {
        let mut a = channel();
        let mut b = channel();
        a.send_typed("delta", &json!({"text": "hi"})).unwrap();
        b.send_typed_raw("delta", "{\"text\":\"hi\"}").unwrap();
        assert_eq!(a.sink.as_str(), b.sink.as_str());
    }

    #[test]
    fn test_data_event_strips_redundant_framing() {
        let mut ch = channel();
        ch.send_data("data: foo\n").unwrap();
        assert_eq!(ch.sink.as_str(), "data: foo\n\n");
    }

    #[test]
    fn test_ping_frame() {
        let mut ch = channel();
        ch.send_ping().unwrap();
        assert_eq!(ch.sink.as_str(), ": PING\n\n");
    }

    #[test]
    fn test_send_sequence_then_terminate() {
        let mut ch = channel();
        ch.send_typed("delta", &json!({"text": "a"})).unwrap();
        ch.send_data("chunk-b").unwrap();
        ch.terminate().unwrap();
        assert_eq!(
            ch.sink.as_str(),
            "event: delta\ndata: {\"text\":\"a\"}\n\ndata: chunk-b\n\ndata: [DONE]\n\n"
        );
        // One flush per event
        assert_eq!(ch.sink.flush_count(), 3);
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut ch = channel();
        ch.terminate().unwrap();
        ch.terminate().unwrap();
        assert_eq!(ch.sink.as_str(), "data: [DONE]\n\n");
        assert_eq!(ch.sink.as_str().matches("[DONE]").count(), 1);
    }

    #[test]
    fn test_sends_rejected_after_terminate() {
        let mut ch = channel();
        ch.terminate().unwrap();
        let before = ch.sink.bytes().len();
        assert!(matches!(ch.send_data("late"), Err(Error::Terminated)));
        assert!(matches!(ch.send_ping(), Err(Error::Terminated)));
        assert_eq!(ch.sink.bytes().len(), before);
    }

    #[test]
    fn test_headers_applied_exactly_once() {
        let mut ch = channel();
        ch.ensure_headers().unwrap();
        ch.ensure_headers().unwrap();
        ch.send_data("x").unwrap();
        assert_eq!(ch.sink.headers().len(), EVENT_STREAM_HEADERS.len());
        assert_eq!(ch.sink.headers()[0].0, "content-type");
        assert_eq!(ch.sink.headers()[0].1, "text/event-stream");
    }

    #[test]
    fn test_first_send_initializes_headers() {
        let mut ch = channel();
        ch.send_ping().unwrap();
        assert_eq!(ch.sink.headers().len(), EVENT_STREAM_HEADERS.len());
    }

    #[test]
    fn test_unflushable_sink_fails_every_send() {
        let mut ch = StreamChannel::new(BufferSink::without_flush());
        assert!(matches!(ch.send_data("x"), Err(Error::Unflushable)));
        assert!(matches!(ch.send_ping(), Err(Error::Unflushable)));
        assert!(matches!(
            ch.send_typed("e", &json!({})),
            Err(Error::Unflushable)
        ));
        assert!(matches!(
            ch.send_typed_raw("e", "{}"),
            Err(Error::Unflushable)
        ));
        assert!(matches!(
            ch.send_object(Some(&json!({}))),
            Err(Error::Unflushable)
        ));
        assert!(matches!(ch.terminate(), Err(Error::Unflushable)));
    }

    #[test]
    fn test_send_object_nil_writes_nothing() {
        let mut ch = channel();
        let err = ch.send_object::<serde_json::Value>(None).unwrap_err();
        assert!(matches!(err, Error::NullPayload));
        assert!(ch.sink.bytes().is_empty());
        assert_eq!(ch.sink.flush_count(), 0);
    }

    #[test]
    fn test_send_object_serializes_to_data_frame() {
        let mut ch = channel();
        ch.send_object(Some(&json!({"k": 1}))).unwrap();
        assert_eq!(ch.sink.as_str(), "data: {\"k\":1}\n\n");
    }

    #[test]
    fn test_liveness_tracks_dropped_receiver() {
        use crate::sink::ChannelSink;

        let (sink, rx) = ChannelSink::new();
        let mut ch = StreamChannel::new(sink);
        assert!(ch.is_alive());
        ch.send_data("still connected").unwrap();

        drop(rx);
        assert!(!ch.is_alive());
        assert!(matches!(ch.send_data("peer gone"), Err(Error::SinkClosed)));
    }

    #[test]
    fn test_failed_terminate_never_repeats_sentinel() {
        let mut ch = StreamChannel::new(BufferSink::without_flush());
        // First terminate writes the sentinel but the flush fails
        assert!(ch.terminate().is_err());
        // Retry must not write it again
        ch.terminate().unwrap();
        assert_eq!(ch.sink.as_str().matches("[DONE]").count(), 1);
    }
}
