use wirecall_protocol::RpcId;

/// Errors raised by the registry layer.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two handlers were registered for the same identity. This is a
    /// build defect in the callable set, not a runtime condition, and
    /// bring-up should treat it as fatal.
    #[error("duplicate handler registered for {0}")]
    DuplicateHandler(RpcId),
}
