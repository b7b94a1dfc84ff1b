//! # wirecall
//!
//! RPC identity translation and dispatch for client/server game
//! networking.
//!
//! wirecall sits between the transport and game code. Game code names a
//! remote procedure by its stable `(klass, function)` identity; the wire
//! carries compact codes the server assigns per session; this crate owns
//! the mapping between the two and the dispatch of inbound calls to
//! registered handlers. The transport itself (framing, ordering,
//! connection lifecycle) is the host's, not ours: raw bytes come in
//! through [`RpcClient::handle_frame`] / [`RpcServer::handle_frame`] and
//! outbound messages are handed back for the host to send.
//!
//! ## Quick start
//!
//! ```rust
//! use wirecall::prelude::*;
//!
//! const PING: RpcId = RpcId::from_names("Net", "Ping");
//!
//! // Server: fixed callable set, authoritative numbering.
//! let server = hook::prepare_server(
//!     RpcSetup::new().handler(PING, |ctx| {
//!         println!("ping from {}", ctx.connection);
//!         Ok(())
//!     }),
//! )?;
//!
//! // Client: start a session, install the server's definitions, call by
//! // identity. The returned message goes to the transport for sending.
//! let mut client = hook::prepare(RpcSetup::new())?;
//! let server_conn = ConnectionId::new(1);
//! client.begin_session(server_conn);
//! client.handle_message(PacketEnvelope::new(server_conn, server.handshake()));
//!
//! let message = client.call(PING, b"{}".to_vec());
//! assert!(message.is_some());
//! # Ok::<(), WirecallError>(())
//! ```

pub mod hook;

mod client;
mod config;
mod error;
mod server;

pub use client::{LinkState, RpcClient};
pub use config::DispatchConfig;
pub use error::WirecallError;
pub use hook::RpcSetup;
pub use server::RpcServer;

// Re-export the layer crates' surface so hosts need only this crate.
pub use wirecall_protocol::{
    ClientCall, ClientMessage, Codec, ConnectionId, JsonCodec, PacketEnvelope, ProtocolError,
    RpcDefinition, RpcDefinitions, RpcId, ServerCall, ServerMessage, WireId,
};
pub use wirecall_registry::{
    CallContext, Handler, HandlerError, HandlerRegistry, RegistryError, TranslationTable,
    WireAssigner,
};

/// The common imports for hosts embedding the dispatch layer.
pub mod prelude {
    pub use crate::hook::{self, prepare, prepare_server};
    pub use crate::{
        CallContext, ClientMessage, Codec, ConnectionId, DispatchConfig, HandlerError,
        LinkState, PacketEnvelope, RpcClient, RpcId, RpcServer, RpcSetup, ServerMessage,
        WireId, WirecallError,
    };
}
