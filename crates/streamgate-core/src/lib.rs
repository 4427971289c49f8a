//! Streamgate Core
//!
//! Core types and pure helpers shared across Streamgate components.
//!
//! This crate provides:
//! - The logical event vocabulary and byte-exact SSE frame rendering
//! - Stream-chunk payload construction (stop, usage, delta chunks)
//! - Correlation-id derivation from the ambient request trace id
//! - The fallback token estimator used for usage accounting
//! - Error types and result handling

pub mod chunk;
pub mod error;
pub mod estimator;
pub mod event;
pub mod identity;

pub use chunk::{delta_chunk, stop_chunk, usage_chunk, ApiError, Delta, StreamChunk, StreamChoice, Usage};
pub use error::{Error, Result};
pub use estimator::estimate_tokens;
pub use event::{LogicalEvent, DONE_SENTINEL};
pub use identity::{realtime_event_id, response_id};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chunk::{delta_chunk, stop_chunk, usage_chunk, StreamChunk, Usage};
    pub use crate::error::{Error, Result};
    pub use crate::estimator::estimate_tokens;
    pub use crate::event::{LogicalEvent, DONE_SENTINEL};
    pub use crate::identity::{realtime_event_id, response_id};
}
