//! Wire protocol for wirecall.
//!
//! This crate defines the "language" of the RPC channel:
//!
//! - **Identifiers** ([`RpcId`], [`WireId`], [`ConnectionId`]) - the
//!   stable composite identity of an RPC, the compact session-scoped
//!   code substituted for it on the wire, and the transport connection
//!   a packet arrived on.
//! - **Messages** ([`ServerMessage`], [`ClientMessage`] and their
//!   payloads) - the definitions handshake and the two directions of
//!   call, each in its own identifier space.
//! - **Codec** ([`Codec`], [`JsonCodec`]) - how messages become bytes.
//! - **Errors** ([`ProtocolError`]) - what can go wrong doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw ordered bytes per
//! connection) and dispatch (registries and handlers). It knows nothing
//! about either: it only defines shapes and encodings.
//!
//! ```text
//! Transport (bytes) -> Protocol (PacketEnvelope<Message>) -> Dispatch
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCall, ClientMessage, ConnectionId, PacketEnvelope, RpcDefinition,
    RpcDefinitions, RpcId, ServerCall, ServerMessage, WireId,
};
