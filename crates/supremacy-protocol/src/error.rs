//! Error types for the protocol layer.
//!
//! Each crate defines its own error enum, so a `ProtocolError` always
//! means the problem is in serialization or message validity, not in
//! networking or session management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, wrong data types, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but violates protocol rules — e.g. a
    /// response arriving with no outstanding call, or a request on a
    /// host-to-client channel.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
