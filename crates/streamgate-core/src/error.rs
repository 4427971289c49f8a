//! Error types for Streamgate

/// Result type alias using Streamgate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Streamgate delivery operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sink cannot flush, so incremental delivery cannot be guaranteed
    #[error("streaming error: sink does not support flush")]
    Unflushable,

    /// The duplex connection handle is unbound
    #[error("realtime connection is absent")]
    ConnectionAbsent,

    /// Payload serialization failed
    #[error("error serializing payload: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A value was required but absent
    #[error("payload is nil")]
    NullPayload,

    /// The channel has already delivered its termination sentinel
    #[error("stream channel already terminated")]
    Terminated,

    /// The receiving side of the sink is gone
    #[error("sink closed by peer")]
    SinkClosed,

    /// Network/IO errors from the underlying transport
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
