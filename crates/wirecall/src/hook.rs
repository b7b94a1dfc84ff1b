//! One-time bring-up of the dispatch subsystem.
//!
//! The host calls [`prepare`] (or [`prepare_server`]) exactly once, at
//! its preparation point before any network traffic, and threads the
//! returned dispatcher through its drain loop. There is no global
//! install and nothing to tear down; dropping the handle is the
//! teardown.

use tracing::{error, info, warn};

use wirecall_protocol::{Codec, JsonCodec, RpcId};
use wirecall_registry::{CallContext, Handler, HandlerError, HandlerRegistry};

use crate::{DispatchConfig, RpcClient, RpcServer, WirecallError};

/// Declarative bring-up description: the handler set and the dispatch
/// config.
///
/// # Example
///
/// ```rust
/// use wirecall::{RpcId, RpcSetup, hook};
///
/// const MOTD: RpcId = RpcId::from_names("Chat", "Motd");
///
/// let client = hook::prepare(
///     RpcSetup::new().handler(MOTD, |ctx| {
///         println!("motd from {} ({} bytes)", ctx.connection, ctx.args.len());
///         Ok(())
///     }),
/// )?;
/// # Ok::<(), wirecall::WirecallError>(())
/// ```
pub struct RpcSetup {
    handlers: Vec<(RpcId, Handler)>,
    config: DispatchConfig,
}

impl RpcSetup {
    /// Starts an empty setup with the default config.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            config: DispatchConfig::default(),
        }
    }

    /// Adds a handler thunk for `id`.
    ///
    /// Duplicates are not rejected here; they surface as a fatal error
    /// from `prepare`, where the whole set is validated at once.
    pub fn handler<F>(mut self, id: RpcId, f: F) -> Self
    where
        F: Fn(CallContext<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers.push((id, Box::new(f)));
        self
    }

    /// Overrides the dispatch config.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the set and builds just the handler registry.
    ///
    /// For hosts that assemble a dispatcher manually, and for feeding a
    /// fresh callable set to [`RpcServer::reload`]. The config carried
    /// by the setup is not used here.
    pub fn into_registry(self) -> Result<HandlerRegistry, WirecallError> {
        build_registry(self.handlers)
    }
}

impl Default for RpcSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepares the client dispatcher with the default JSON codec.
///
/// Performs the one-time handler registration and hands back the
/// dispatcher. A duplicate registration in `setup` is a build defect:
/// it is logged here and returned as `Err`, and the host should
/// continue without the RPC subsystem rather than crash.
pub fn prepare(setup: RpcSetup) -> Result<RpcClient<JsonCodec>, WirecallError> {
    prepare_with_codec(setup, JsonCodec)
}

/// [`prepare`] with a caller-chosen codec.
pub fn prepare_with_codec<C: Codec>(
    setup: RpcSetup,
    codec: C,
) -> Result<RpcClient<C>, WirecallError> {
    let handlers = build_registry(setup.handlers)?;
    info!(handlers = handlers.len(), "client rpc dispatch prepared");
    Ok(RpcClient::new(handlers, codec, setup.config))
}

/// Prepares the server dispatcher with the default JSON codec.
///
/// Same bring-up contract as [`prepare`]; additionally numbers the
/// callable set so [`RpcServer::handshake`] is ready immediately.
pub fn prepare_server(setup: RpcSetup) -> Result<RpcServer<JsonCodec>, WirecallError> {
    prepare_server_with_codec(setup, JsonCodec)
}

/// [`prepare_server`] with a caller-chosen codec.
pub fn prepare_server_with_codec<C: Codec>(
    setup: RpcSetup,
    codec: C,
) -> Result<RpcServer<C>, WirecallError> {
    if setup.handlers.len() > setup.config.max_definition_entries {
        // Clients running the default config will reject our handshake.
        warn!(
            handlers = setup.handlers.len(),
            max = setup.config.max_definition_entries,
            "callable set exceeds the definitions cap"
        );
    }
    let handlers = build_registry(setup.handlers)?;
    info!(handlers = handlers.len(), "server rpc dispatch prepared");
    Ok(RpcServer::new(handlers, codec))
}

fn build_registry(entries: Vec<(RpcId, Handler)>) -> Result<HandlerRegistry, WirecallError> {
    let mut handlers = HandlerRegistry::new();
    for (id, handler) in entries {
        if let Err(e) = handlers.register(id, handler) {
            error!(%id, "duplicate rpc handler registration, bring-up aborted");
            return Err(e.into());
        }
    }
    Ok(handlers)
}

// =========================================================================
// Tests
// =========================================================================
