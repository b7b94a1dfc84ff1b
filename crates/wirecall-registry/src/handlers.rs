//! The inbound handler registry: identity to executable thunk.
//!
//! The receiving side owns one of these. Unlike the translation table it
//! is not session-scoped: the set of locally callable functions is fixed
//! at build time, populated once during bring-up, and never mutated
//! afterwards. There is no replace semantics and no handshake here.

use wirecall_protocol::{ConnectionId, RpcId};

use crate::RegistryError;

/// Per-call context handed to a handler thunk.
///
/// Arguments stay serialized at this layer. The thunk was generated for
/// exactly one RPC signature and is the only code allowed to decode
/// them; dispatch never peeks inside.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Connection the call arrived on. On the server this identifies the
    /// calling player's connection; on the client it is the server link.
    pub connection: ConnectionId,
    /// The serialized argument payload, opaque until the thunk decodes it.
    pub args: &'a [u8],
}

/// Error a handler thunk reports back to dispatch.
///
/// Dispatch logs these and moves on. A handler outcome never influences
/// routing or connection state; the dispatcher only guarantees the call
/// was attempted.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The argument payload did not decode under the handler's schema.
    #[error("argument decode failed: {0}")]
    BadArguments(String),

    /// The handler ran and reported a domain failure of its own.
    #[error("handler failed: {0}")]
    Failed(String),
}

/// A type-erased decode-and-invoke thunk bound to one RPC signature.
///
/// Produced by the schema toolchain (or written by hand in tests): the
/// closure captures its own argument decoding and the call into game
/// code. Boxing a closure here replaces what a polymorphic handler
/// hierarchy would do in other stacks; the registry neither knows nor
/// cares what is inside.
pub type Handler =
    Box<dyn Fn(CallContext<'_>) -> Result<(), HandlerError> + Send + Sync>;

/// Inbound-side cache of `(identity, handler)` pairs.
///
/// Deliberately a compact vector with linear-scan resolution rather
/// than a hash map: the registered set is small and bounded at build
/// time, so the scan stays cache-friendly and skips hashing entirely on
/// the per-call hot path.
///
/// Read-only after bring-up, which makes it safe for unsynchronized
/// concurrent reads for the life of the process.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<(RpcId, Handler)>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a handler for `id`. Bring-up only: must complete before any
    /// traffic is processed.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateHandler`] if `id` is already
    /// registered. Two handlers claiming one identity is a build-time
    /// defect with no safe resolution; initialization must halt rather
    /// than silently keep either.
    pub fn register(&mut self, id: RpcId, handler: Handler) -> Result<(), RegistryError> {
        if self.entries.iter().any(|(existing, _)| *existing == id) {
            return Err(RegistryError::DuplicateHandler(id));
        }
        self.entries.push((id, handler));
        Ok(())
    }

    /// Looks up the handler for an identity.
    ///
    /// Pure read. Returns the same handler for every call with an equal
    /// identity, independent of registration order.
    pub fn resolve(&self, id: RpcId) -> Option<&Handler> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, handler)| handler)
    }

    /// Iterates the registered identities in registration order.
    ///
    /// The server-side bring-up uses this to hand its callable set to
    /// the wire assigner.
    pub fn ids(&self) -> impl Iterator<Item = RpcId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Handlers are opaque closures; list the identities only.
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.entries.iter().map(|(id, _)| *id).collect::<Vec<_>>())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
