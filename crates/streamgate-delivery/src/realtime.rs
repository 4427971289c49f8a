//! Realtime duplex channel
//!
//! Wraps a persistent message-oriented connection for bidirectional
//! sessions. One text frame per logical event, no additional framing;
//! FIFO ordering comes from the connection's single-writer discipline.

use async_trait::async_trait;
use serde::Serialize;
use streamgate_core::{realtime_event_id, ApiError, Error, Result};
use tracing::error;

/// A message-oriented duplex connection that can carry one complete text
/// frame per call
#[async_trait]
pub trait DuplexConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;
}

/// Error event sent to the peer over the duplex transport
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeErrorEvent {
    #[serde(rename = "type")]
    pub kind: String,

    /// Correlation id derived from the request trace id (`evt_` prefix)
    pub event_id: String,

    pub error: ApiError,
}

/// Per-session channel over a duplex connection
///
/// The connection is an explicit optional: every operation that needs it
/// checks first and yields [`Error::ConnectionAbsent`] rather than an
/// implicit no-op.
pub struct RealtimeChannel<C> {
    conn: Option<C>,
    trace_id: String,
}

impl<C: DuplexConnection> RealtimeChannel<C> {
    /// Create a channel bound to a live connection
    pub fn new(conn: C, trace_id: impl Into<String>) -> Self {
        Self {
            conn: Some(conn),
            trace_id: trace_id.into(),
        }
    }

    /// Create a channel with no connection yet
    pub fn unbound(trace_id: impl Into<String>) -> Self {
        Self {
            conn: None,
            trace_id: trace_id.into(),
        }
    }

    /// Attach a connection to an unbound channel
    pub fn bind(&mut self, conn: C) {
        self.conn = Some(conn);
    }

    /// Send `text` as one complete text message frame
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        let Some(conn) = self.conn.as_mut() else {
            error!(trace_id = %self.trace_id, "realtime connection is absent");
            return Err(Error::ConnectionAbsent);
        };
        conn.send_text(text.into()).await
    }

    /// Serialize `value` and send it as one text frame
    pub async fn send_object<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.send_text(json).await
    }

    /// Notify the peer of an error, best effort
    ///
    /// The caller is already on a failure path; a failure to deliver the
    /// notification must not mask the original error, so it is swallowed.
    pub async fn send_error(&mut self, api_error: ApiError) {
        let event = RealtimeErrorEvent {
            kind: "error".to_string(),
            event_id: realtime_event_id(&self.trace_id),
            error: api_error,
        };
        let _ = self.send_object(&event).await;
    }
}
