//! Error types for the protocol layer.
//!
//! Each wirecall crate defines its own error enum so a failure names the
//! layer it came from: a `ProtocolError` is always about bytes and
//! message shapes, never about registries or dispatch state.

/// Errors that can occur while encoding or decoding wire messages.
///
/// The serializer variants box their cause so any [`Codec`] backend can
/// report through the same enum.
///
/// [`Codec`]: crate::Codec
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[error("encode failed: {0}")]
    Encode(Box<dyn std::error::Error + Send + Sync>),

    /// Deserialization failed (turning bytes into a message).
    ///
    /// Common causes: truncated frames, a peer speaking a different
    /// protocol version, or plain corruption.
    #[error("decode failed: {0}")]
    Decode(Box<dyn std::error::Error + Send + Sync>),

    /// The message decoded but violates a protocol rule, e.g. a
    /// definitions batch larger than the configured limit.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
