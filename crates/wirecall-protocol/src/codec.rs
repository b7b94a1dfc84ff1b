//! Codec trait and implementations for message framing payloads.
//!
//! A codec converts between typed messages and the raw bytes the
//! transport carries. Dispatch code never cares which encoding is in
//! use; it only needs something that implements [`Codec`]. Note the
//! scope: codecs here cover the RPC *message* layer (definitions and
//! call frames). Argument payloads inside a call stay opaque byte blobs;
//! decoding those belongs to the per-RPC handler thunks.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes typed messages to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` so a codec can be shared with whatever task
/// or thread drains the transport for the life of the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or do not match the expected message shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, which makes development sessions easy to inspect on
/// the wire. Behind the default `json` feature so binary-only builds can
/// opt out.
///
/// ## Example
///
/// ```rust
/// use wirecall_protocol::{ClientCall, ClientMessage, Codec, JsonCodec, WireId};
///
/// let codec = JsonCodec;
/// let msg = ClientMessage::Call(ClientCall {
///     wire_id: WireId(7),
///     args: vec![1, 2, 3],
/// });
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ClientMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(Box::new(e)))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(Box::new(e)))
    }
}
