//! Streamgate Delivery
//!
//! The streaming-event encoder/dispatcher. Binds a transport sink to a
//! per-request channel, guarantees correct SSE framing and flush timing,
//! idempotent header initialization, and at-most-once termination across
//! both transport shapes:
//!
//! - [`StreamChannel`]: unidirectional event stream over a long-lived HTTP
//!   response body
//! - [`RealtimeChannel`]: bidirectional duplex socket session, one text
//!   frame per logical event

pub mod channel;
pub mod realtime;
pub mod sink;

pub use channel::{StreamChannel, EVENT_STREAM_HEADERS};
pub use realtime::{DuplexConnection, RealtimeChannel, RealtimeErrorEvent};
pub use sink::{BufferSink, ChannelSink, EventSink, FlushOutcome};
