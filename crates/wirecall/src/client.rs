//! Client-side dispatcher: definitions intake and call routing.
//!
//! The host owns one `RpcClient` and drives it from its network drain,
//! one decoded message at a time. The flow over a session is:
//!   1. Transport connects → `begin_session` with the server connection
//!   2. Server's `Definitions` arrives → translation table installed → Ready
//!   3. Loop: inbound `Call`s run local handlers; outbound calls are
//!      translated to the server's wire numbering and handed back for send

use tracing::{debug, info, trace, warn};

use wirecall_protocol::{
    ClientCall, ClientMessage, Codec, ConnectionId, PacketEnvelope, ProtocolError,
    RpcDefinitions, RpcId, ServerCall, ServerMessage, WireId,
};
use wirecall_registry::{CallContext, HandlerRegistry, TranslationTable};

use crate::DispatchConfig;

// ---------------------------------------------------------------------------
// LinkState
// ---------------------------------------------------------------------------

/// Where the client link stands in the definitions handshake.
///
/// ```text
/// Uninitialized ──(begin_session)──▶ AwaitingDefinitions ──(definitions)──▶ Ready
///       ▲                                                                     │
///       └───────────────────────────(end_session)─────────────────────────────┘
/// ```
///
/// - **Uninitialized**: handlers are registered but no session is active.
/// - **AwaitingDefinitions**: connected to the designated server, translation
///   table still empty. Outbound calls fail exactly as in Uninitialized.
/// - **Ready**: a definitions batch is installed; mapped identities can be
///   called. Later batches re-replace the table and stay Ready.
///
/// The active states carry the server's [`ConnectionId`]: it is the only
/// peer allowed to install definitions for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Uninitialized,
    AwaitingDefinitions { server: ConnectionId },
    Ready { server: ConnectionId },
}

impl LinkState {
    /// `true` once a definitions batch is installed.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// The designated server connection of the active session, if any.
    pub fn server(&self) -> Option<ConnectionId> {
        match self {
            Self::Uninitialized => None,
            Self::AwaitingDefinitions { server } | Self::Ready { server } => Some(*server),
        }
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::AwaitingDefinitions { .. } => write!(f, "AwaitingDefinitions"),
            Self::Ready { .. } => write!(f, "Ready"),
        }
    }
}

// ---------------------------------------------------------------------------
// RpcClient
// ---------------------------------------------------------------------------

/// The client half of the dispatch layer.
///
/// Owns the session-scoped translation table, the fixed handler set, and
/// the link state machine. Everything here runs on the host's single
/// dispatch thread: methods never block, handlers run synchronously to
/// completion, and `&mut self` on the mutating entries keeps replacement
/// unobservable mid-way.
pub struct RpcClient<C: Codec> {
    codec: C,
    config: DispatchConfig,
    handlers: HandlerRegistry,
    table: TranslationTable,
    state: LinkState,
}

impl<C: Codec> RpcClient<C> {
    /// Builds a dispatcher around an already-populated handler registry.
    ///
    /// [`hook::prepare`](crate::hook::prepare) is the usual bring-up path;
    /// this constructor is the escape hatch for hosts that assemble the
    /// registry themselves.
    pub fn new(handlers: HandlerRegistry, codec: C, config: DispatchConfig) -> Self {
        Self {
            codec,
            config: config.validated(),
            handlers,
            table: TranslationTable::new(),
            state: LinkState::Uninitialized,
        }
    }

    // --- Session lifecycle ---

    /// Marks a new session with `server` as the designated definitions
    /// source.
    ///
    /// Clears any previous translation table first: wire codes belong to
    /// one connection's lifetime and must never leak across a reconnect.
    pub fn begin_session(&mut self, server: ConnectionId) {
        self.table.clear();
        self.state = LinkState::AwaitingDefinitions { server };
        info!(%server, "session started, awaiting rpc definitions");
    }

    /// Tears the session down and returns to `Uninitialized`.
    pub fn end_session(&mut self) {
        if let Some(server) = self.state.server() {
            info!(%server, "session ended");
        }
        self.table.clear();
        self.state = LinkState::Uninitialized;
    }

    // --- Inbound path ---

    /// Decodes one raw frame and dispatches it.
    ///
    /// Undecodable frames are dropped with a log line; malformed input
    /// from the network is expected and never an error for the host.
    pub fn handle_frame(&mut self, connection: ConnectionId, bytes: &[u8]) {
        let message: ServerMessage = match self.codec.decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                debug!(%connection, error = %e, "failed to decode server frame, dropping");
                return;
            }
        };
        self.handle_message(PacketEnvelope::new(connection, message));
    }

    /// Dispatches one decoded message from the network drain.
    pub fn handle_message(&mut self, envelope: PacketEnvelope<ServerMessage>) {
        match envelope.message {
            ServerMessage::Definitions(defs) => {
                self.install_definitions(envelope.connection, defs);
            }
            ServerMessage::Call(call) => self.dispatch_call(envelope.connection, call),
        }
    }

    fn install_definitions(&mut self, sender: ConnectionId, defs: RpcDefinitions) {
        let Some(server) = self.state.server() else {
            warn!(%sender, "rpc definitions with no active session, dropping");
            return;
        };
        if sender != server {
            warn!(%sender, %server, "rpc definitions from non-designated connection, dropping");
            return;
        }
        if defs.entries.len() > self.config.max_definition_entries {
            // Rejected whole: a truncated mapping would misroute calls.
            warn!(
                entries = defs.entries.len(),
                max = self.config.max_definition_entries,
                "oversized rpc definitions batch, dropping"
            );
            return;
        }

        let entries = defs.entries.len();
        self.table.replace_all(defs.entries);
        self.state = LinkState::Ready { server };
        info!(entries, "rpc definitions installed, link ready");
    }

    fn dispatch_call(&self, connection: ConnectionId, call: ServerCall) {
        // Resolution comes first; the payload of an undeliverable call is
        // never decoded.
        let Some(handler) = self.handlers.resolve(call.id) else {
            warn!(%connection, id = %call.id, "call for unregistered rpc, dropping");
            return;
        };

        trace!(id = %call.id, "dispatching server call");
        if let Err(e) = handler(CallContext {
            connection,
            args: &call.args,
        }) {
            warn!(id = %call.id, error = %e, "rpc handler failed");
        }
    }

    // --- Outbound path ---

    /// Builds the wire-addressed call message for `id`, if it is currently
    /// callable.
    ///
    /// `None` means the identity has no wire code right now: either the
    /// link is not [`Ready`](LinkState::Ready) or the server's definitions
    /// did not include it. The two cases are deliberately
    /// indistinguishable; nothing may be sent for an unmapped identity.
    pub fn call(&self, id: RpcId, args: Vec<u8>) -> Option<ClientMessage> {
        let Some(wire_id) = self.table.lookup(id) else {
            debug!(%id, state = %self.state, "no wire code for rpc, call unavailable");
            return None;
        };
        Some(ClientMessage::Call(ClientCall { wire_id, args }))
    }

    /// The wire code currently mapped to `id`, if any.
    pub fn wire_id(&self, id: RpcId) -> Option<WireId> {
        self.table.lookup(id)
    }

    // --- Diagnostics ---

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Encodes an outbound message with this dispatcher's codec.
    pub fn encode(&self, message: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
        self.codec.encode(message)
    }
}

// =========================================================================
// Tests
// =========================================================================
