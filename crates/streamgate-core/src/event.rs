//! Logical stream events and SSE frame rendering
//!
//! Every event delivered over the event-stream transport renders to one of
//! four byte-exact frame shapes:
//! ```text
//! event: <name>\ndata: <json>\n\n
//! data: <payload>\n\n
//! : PING\n\n
//! data: [DONE]\n\n
//! ```

/// Sentinel payload signaling end-of-stream to the client
pub const DONE_SENTINEL: &str = "[DONE]";

/// A logical event in the delivery vocabulary, shared by both transports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalEvent {
    /// Plain data event carrying an opaque payload (content/tool-call delta)
    Data(String),

    /// Named event with a pre-serialized payload
    Typed { name: String, payload: String },

    /// Comment-style keep-alive frame, no data payload
    Ping,

    /// End-of-stream sentinel
    Done,
}

impl LogicalEvent {
    /// Create a data event, normalizing upstream double-framing first
    pub fn data(raw: &str) -> Self {
        Self::Data(normalize_payload(raw).to_string())
    }

    /// Create a typed event
    pub fn typed(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Typed {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Render this event into its exact event-stream wire bytes
    pub fn frame(&self) -> String {
        match self {
            Self::Data(payload) => format!("data: {payload}\n\n"),
            Self::Typed { name, payload } => format!("event: {name}\ndata: {payload}\n\n"),
            Self::Ping => ": PING\n\n".to_string(),
            Self::Done => format!("data: {DONE_SENTINEL}\n\n"),
        }
    }
}

/// Strip a redundant leading `data: ` prefix and trailing line breaks
///
/// Upstream producers sometimes hand us an already-framed SSE line; the
/// frame renderer re-adds both, so they must come off first.
pub fn normalize_payload(raw: &str) -> &str {
    raw.strip_prefix("data: ")
        .unwrap_or(raw)
        .trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_frame() {
        let event = LogicalEvent::typed("content_block_delta", r#"{"delta":"hi"}"#);
        assert_eq!(
            event.frame(),
            "event: content_block_delta\ndata: {\"delta\":\"hi\"}\n\n"
        );
    }

    #[test]
    fn test_data_frame() {
        assert_eq!(LogicalEvent::data("foo").frame(), "data: foo\n\n");
    }

    #[test]
    fn test_ping_frame() {
        assert_eq!(LogicalEvent::Ping.frame(), ": PING\n\n");
    }

    #[test]
    fn test_done_frame() {
        assert_eq!(LogicalEvent::Done.frame(), "data: [DONE]\n\n");
    }

    #[test]
    fn test_normalize_strips_prefix_and_line_breaks() {
        assert_eq!(normalize_payload("data: foo\n"), "foo");
        assert_eq!(normalize_payload("data: foo\r\n"), "foo");
        assert_eq!(normalize_payload("foo"), "foo");
        // Only one prefix comes off; inner occurrences are payload
        assert_eq!(normalize_payload("data: data: foo"), "data: foo");
    }

    #[test]
    fn test_prefixed_input_reframes_exactly_once() {
        assert_eq!(LogicalEvent::data("data: foo\n").frame(), "data: foo\n\n");
    }
}
