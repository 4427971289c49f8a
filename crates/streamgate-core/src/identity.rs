//! Correlation-id derivation
//!
//! Pure string derivations from the ambient request-trace id. Uniqueness is
//! owned by the tracing collaborator; these only add the wire prefixes.

/// Derive the response id for a completion stream
pub fn response_id(trace_id: &str) -> String {
    format!("chatcmpl-{trace_id}")
}

/// Derive the event id for a realtime (duplex) event
pub fn realtime_event_id(trace_id: &str) -> String {
    format!("evt_{trace_id}")
}
