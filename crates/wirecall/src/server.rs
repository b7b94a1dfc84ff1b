//! Server-side dispatcher: authoritative numbering and call routing.
//!
//! The server mints the wire numbering clients translate against, so
//! this side has no link state machine and no translation table. Its
//! callable set is fixed at bring-up like the client's; the numbering
//! derives from it and changes only through [`RpcServer::reload`].

use tracing::{debug, info, trace, warn};

use wirecall_protocol::{
    ClientCall, ClientMessage, Codec, ConnectionId, PacketEnvelope, ProtocolError, RpcId,
    ServerCall, ServerMessage, WireId,
};
use wirecall_registry::{CallContext, HandlerRegistry, WireAssigner};

/// The server half of the dispatch layer.
///
/// Runs on the server's single network-drain thread, same discipline as
/// the client side: nothing blocks, handlers run synchronously, and the
/// only post-bring-up mutation is a wholesale [`reload`](Self::reload).
pub struct RpcServer<C: Codec> {
    codec: C,
    handlers: HandlerRegistry,
    assigner: WireAssigner,
}

impl<C: Codec> RpcServer<C> {
    /// Builds a dispatcher and numbers the registry's callable set.
    ///
    /// [`hook::prepare_server`](crate::hook::prepare_server) is the usual
    /// bring-up path.
    pub fn new(handlers: HandlerRegistry, codec: C) -> Self {
        let mut assigner = WireAssigner::new();
        assigner.assign(handlers.ids());
        Self {
            codec,
            handlers,
            assigner,
        }
    }

    // --- Numbering ---

    /// The definitions snapshot to send on every newly established
    /// connection. Installing it is what makes a client's link ready.
    pub fn handshake(&self) -> ServerMessage {
        ServerMessage::Definitions(self.assigner.definitions())
    }

    /// Replaces the callable set and renumbers it wholesale.
    ///
    /// This is the hot-reload path: scripts were rebuilt, so the old
    /// handlers and their codes are gone together. Returns the fresh
    /// definitions, which must be broadcast to every live connection;
    /// until a client installs them its calls carry codes from the dead
    /// generation and are dropped as unknown.
    pub fn reload(&mut self, handlers: HandlerRegistry) -> ServerMessage {
        self.handlers = handlers;
        self.assigner.assign(self.handlers.ids());
        info!(
            handlers = self.handlers.len(),
            generation = self.assigner.generation(),
            "rpc set reloaded, wire codes renumbered"
        );
        ServerMessage::Definitions(self.assigner.definitions())
    }

    // --- Inbound path ---

    /// Decodes one raw frame from a client connection and dispatches it.
    pub fn handle_frame(&self, connection: ConnectionId, bytes: &[u8]) {
        let message: ClientMessage = match self.codec.decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                debug!(%connection, error = %e, "failed to decode client frame, dropping");
                return;
            }
        };
        self.handle_message(PacketEnvelope::new(connection, message));
    }

    /// Dispatches one decoded message from a client connection.
    pub fn handle_message(&self, envelope: PacketEnvelope<ClientMessage>) {
        match envelope.message {
            ClientMessage::Call(call) => self.dispatch_call(envelope.connection, call),
        }
    }

    fn dispatch_call(&self, connection: ConnectionId, call: ClientCall) {
        // Translation comes first; a stale or fabricated wire code drops
        // here with the arguments still undecoded.
        let Some(id) = self.assigner.identity(call.wire_id) else {
            warn!(%connection, wire_id = %call.wire_id, "unknown wire code, dropping call");
            return;
        };
        let Some(handler) = self.handlers.resolve(id) else {
            // Numbering is minted from the registry; reaching this means
            // the two drifted, which is a bug on our side.
            warn!(%id, "translated rpc has no handler, dropping call");
            return;
        };

        trace!(%id, wire_id = %call.wire_id, "dispatching client call");
        if let Err(e) = handler(CallContext {
            connection,
            args: &call.args,
        }) {
            warn!(%id, %connection, error = %e, "rpc handler failed");
        }
    }

    // --- Outbound path ---

    /// Builds an identity-addressed call for a client.
    ///
    /// Always succeeds: the client's handler set is not visible here, so
    /// whether the call lands is decided on the receiving side. Picking
    /// the target connection is the transport caller's job.
    pub fn call(&self, id: RpcId, args: Vec<u8>) -> ServerMessage {
        ServerMessage::Call(ServerCall { id, args })
    }

    // --- Diagnostics ---

    /// The wire code currently assigned to `id`, if it is callable.
    pub fn wire_id(&self, id: RpcId) -> Option<WireId> {
        self.assigner.wire_id(id)
    }

    /// Numbering generation, bumped by every [`reload`](Self::reload).
    pub fn generation(&self) -> u64 {
        self.assigner.generation()
    }

    /// Encodes an outbound message with this dispatcher's codec.
    pub fn encode(&self, message: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
        self.codec.encode(message)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wirecall_protocol::JsonCodec;
    use wirecall_registry::Handler;

    const CLIENT: ConnectionId = ConnectionId::new(5);

    fn counting(counter: Arc<AtomicUsize>) -> Handler {
        Box::new(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn registry(ids: &[RpcId], counter: &Arc<AtomicUsize>) -> HandlerRegistry {
        let mut handlers = HandlerRegistry::new();
        for id in ids {
            handlers.register(*id, counting(counter.clone())).unwrap();
        }
        handlers
    }

    #[test]
    fn test_handshake_covers_callable_set() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = RpcServer::new(
            registry(&[RpcId::new(1, 2), RpcId::new(3, 4)], &hits),
            JsonCodec,
        );

        let ServerMessage::Definitions(defs) = server.handshake() else {
            panic!("handshake must carry definitions");
        };
        assert_eq!(defs.entries.len(), 2);
        for entry in &defs.entries {
            assert_eq!(server.wire_id(entry.id), Some(entry.wire_id));
        }
    }

    #[test]
    fn test_inbound_call_translates_and_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = RpcServer::new(registry(&[RpcId::new(1, 2)], &hits), JsonCodec);

        let wire_id = server.wire_id(RpcId::new(1, 2)).unwrap();
        server.handle_message(PacketEnvelope::new(
            CLIENT,
            ClientMessage::Call(ClientCall {
                wire_id,
                args: vec![1],
            }),
        ));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_wire_code_dropped() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = RpcServer::new(registry(&[RpcId::new(1, 2)], &hits), JsonCodec);

        server.handle_message(PacketEnvelope::new(
            CLIENT,
            ClientMessage::Call(ClientCall {
                wire_id: WireId(999),
                args: vec![255, 254, 253],
            }),
        ));

        // No handler ran; the payload was never inspected.
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reload_invalidates_previous_codes() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut server = RpcServer::new(
            registry(&[RpcId::new(1, 2), RpcId::new(3, 4)], &hits),
            JsonCodec,
        );
        let old_code = server.wire_id(RpcId::new(3, 4)).unwrap();
        assert_eq!(old_code, WireId(1));
        let first_generation = server.generation();

        // Hot reload drops {1,2}; the survivor is renumbered down to 0.
        server.reload(registry(&[RpcId::new(3, 4)], &hits));

        assert!(server.generation() > first_generation);
        assert_eq!(server.wire_id(RpcId::new(1, 2)), None);
        assert_eq!(server.wire_id(RpcId::new(3, 4)), Some(WireId(0)));

        // A call still carrying the survivor's dead-generation code no
        // longer translates to anything and is dropped.
        server.handle_message(PacketEnvelope::new(
            CLIENT,
            ClientMessage::Call(ClientCall {
                wire_id: old_code,
                args: vec![],
            }),
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_outbound_call_is_identity_addressed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = RpcServer::new(registry(&[], &hits), JsonCodec);

        // No local resolution: any identity can be addressed at a client.
        let message = server.call(RpcId::new(7, 8), vec![9]);
        assert_eq!(
            message,
            ServerMessage::Call(ServerCall {
                id: RpcId::new(7, 8),
                args: vec![9],
            })
        );
    }

    #[test]
    fn test_garbage_frame_dropped() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = RpcServer::new(registry(&[RpcId::new(1, 2)], &hits), JsonCodec);

        server.handle_frame(CLIENT, b"\xff\xfe");

        let wire_id = server.wire_id(RpcId::new(1, 2)).unwrap();
        let bytes = JsonCodec
            .encode(&ClientMessage::Call(ClientCall {
                wire_id,
                args: vec![],
            }))
            .unwrap();
        server.handle_frame(CLIENT, &bytes);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
