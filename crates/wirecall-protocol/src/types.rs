//! Core wire types for the wirecall RPC layer.
//!
//! Everything here either travels on the wire (identifiers, definitions,
//! calls) or wraps something that just arrived (the packet envelope).
//! The message enums are split by direction on purpose: client and server
//! address calls in different identifier spaces, and the types should make
//! it impossible to construct a call in the wrong one.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Name hashing (FNV-1a 64)
// ---------------------------------------------------------------------------

// Offset basis and prime for FNV-1a 64, the name-hash scheme the schema
// toolchain uses. Const so identities can be formed at compile time.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Stable composite identity of one RPC: the class it belongs to and the
/// function within that class.
///
/// Both halves are 64-bit name hashes, so an `RpcId` names the same RPC
/// across builds, sessions, and reconnects. This is the long-lived key;
/// the short-lived, session-scoped counterpart is [`WireId`].
///
/// Two ids are equal iff both fields match. There is deliberately no
/// `Ord`: identities are compared for equality, never ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcId {
    /// Name hash of the owning class.
    pub klass: u64,
    /// Name hash of the function within the class.
    pub function: u64,
}

impl RpcId {
    /// Creates an identity from raw klass/function hashes.
    pub const fn new(klass: u64, function: u64) -> Self {
        Self { klass, function }
    }

    /// Creates an identity by hashing the class and function names with
    /// FNV-1a 64, the same derivation the schema toolchain applies.
    ///
    /// Const, so generated bindings can declare their ids as constants:
    ///
    /// ```rust
    /// use wirecall_protocol::RpcId;
    ///
    /// const SEND_MESSAGE: RpcId = RpcId::from_names("Chat", "SendMessage");
    /// assert_eq!(SEND_MESSAGE, RpcId::from_names("Chat", "SendMessage"));
    /// ```
    pub const fn from_names(klass: &str, function: &str) -> Self {
        Self {
            klass: fnv1a_64(klass.as_bytes()),
            function: fnv1a_64(function.as_bytes()),
        }
    }
}

/// Hashes as one mixed word: `klass ^ (function << 1)`.
///
/// Deterministic over both fields and stable within a process. Not stable
/// across versions, and nothing may rely on it being so: the mixed word
/// never leaves the process.
impl Hash for RpcId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.klass ^ (self.function << 1));
    }
}

impl fmt::Display for RpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:{:#x}", self.klass, self.function)
    }
}

/// Compact, session-scoped code the server substitutes for an [`RpcId`]
/// on the wire.
///
/// Assigned by the server and meaningful only for the lifetime of the
/// connection that received it in a definitions batch. A renumbering
/// (new batch) invalidates every previously seen value; holding one
/// across sessions misroutes calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(pub u32);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire-{}", self.0)
    }
}

/// Opaque identifier for a transport connection.
///
/// Minted by the transport; carried here so dispatch can tell where a
/// packet came from. Not wire data itself: the connection is implicit in
/// the transport session, never serialized into a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Packet envelope
// ---------------------------------------------------------------------------

/// A decoded inbound message paired with the connection it arrived on.
///
/// The transport delivers every payload through this one shape, so
/// dispatch logic never needs per-transport knowledge of connection
/// state. `connection` is always the origin of the packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketEnvelope<M> {
    /// The connection this packet arrived on.
    pub connection: ConnectionId,
    /// The decoded message payload.
    pub message: M,
}

impl<M> PacketEnvelope<M> {
    /// Wraps a decoded message with its originating connection.
    pub fn new(connection: ConnectionId, message: M) -> Self {
        Self {
            connection,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Definitions: the identity -> wire id handshake
// ---------------------------------------------------------------------------

/// One `(identity, wire id)` pair in a definitions batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcDefinition {
    /// The stable identity.
    pub id: RpcId,
    /// The wire code the server assigned to it for this session.
    pub wire_id: WireId,
}

/// Server -> Client: the full current identity-to-wire-id mapping.
///
/// Sent at least once per connection, immediately after establishment.
/// A later batch on the same connection signals a renumbering (for
/// example a server-side script hot reload) and is handled identically:
/// the receiver replaces its whole table. Batches are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcDefinitions {
    /// Every RPC the server currently exposes, with its assigned code.
    pub entries: Vec<RpcDefinition>,
}

// ---------------------------------------------------------------------------
// Calls (direction-dependent identifier spaces)
// ---------------------------------------------------------------------------

/// Server -> Client: invoke a statically registered client handler.
///
/// Identity-addressed. The client's handler set is fixed at build time
/// and never renumbered per session, so the raw identity is the correct
/// key in this direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCall {
    /// Which handler to invoke.
    pub id: RpcId,
    /// Serialized arguments. Opaque at this layer: the argument layout is
    /// chosen per handler and only the matching thunk may decode it.
    pub args: Vec<u8>,
}

/// Client -> Server: invoke a server RPC by its current wire code.
///
/// Wire-addressed. Valid only in the numbering of the server session
/// that issued the code via [`RpcDefinitions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCall {
    /// The server-assigned code for the target RPC.
    pub wire_id: WireId,
    /// Serialized arguments, opaque at this layer.
    pub args: Vec<u8>,
}

/// Everything a server sends on the RPC channel.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "Definitions", "entries": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The handshake/renumbering batch.
    Definitions(RpcDefinitions),
    /// An identity-addressed call into the client's handler set.
    Call(ServerCall),
}

/// Everything a client sends on the RPC channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A wire-addressed call into the server's numbering.
    Call(ClientCall),
}

// =========================================================================
// Tests
// =========================================================================
