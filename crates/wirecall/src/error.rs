//! Unified error type for the wirecall facade.

use wirecall_protocol::ProtocolError;
use wirecall_registry::RegistryError;

/// Top-level error wrapping the layer-specific errors.
///
/// Hosts using the `wirecall` meta-crate deal with this single type;
/// the `#[from]` variants let `?` convert layer errors automatically.
/// Note that most dispatch-path anomalies (undecodable frames, unknown
/// identities) are dropped packets, not errors: this type only covers
/// bring-up and explicit encode/decode calls.
#[derive(Debug, thiserror::Error)]
pub enum WirecallError {
    /// An encode/decode or message-shape error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry bring-up error (duplicate handler).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
