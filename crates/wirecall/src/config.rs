//! Dispatch configuration.

use tracing::warn;

/// Tunables for the dispatch layer.
///
/// Hosts can override the defaults when setting up the subsystem.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Largest definitions batch a peer is allowed to install. A batch
    /// over this size is rejected whole rather than truncated, since a
    /// partial mapping would silently misroute calls. Sized for the
    /// callable surface of a large game plus headroom.
    pub max_definition_entries: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_definition_entries: Self::DEFAULT_MAX_DEFINITION_ENTRIES,
        }
    }
}

impl DispatchConfig {
    /// Default cap on definitions batch size.
    pub const DEFAULT_MAX_DEFINITION_ENTRIES: usize = 4096;

    /// Fix any unusable values so the config is safe to run with.
    ///
    /// Called automatically by [`RpcClient::new`](crate::RpcClient::new).
    /// A cap of 0 would reject every handshake and leave the link
    /// permanently unready, so it falls back to the default.
    pub fn validated(mut self) -> Self {
        if self.max_definition_entries == 0 {
            warn!(
                default = Self::DEFAULT_MAX_DEFINITION_ENTRIES,
                "max_definition_entries of 0 would reject every handshake, using default"
            );
            self.max_definition_entries = Self::DEFAULT_MAX_DEFINITION_ENTRIES;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_a_realistic_batch() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_definition_entries, 4096);
    }

    #[test]
    fn test_validated_rejects_zero_cap() {
        let config = DispatchConfig {
            max_definition_entries: 0,
        }
        .validated();
        assert_eq!(
            config.max_definition_entries,
            DispatchConfig::DEFAULT_MAX_DEFINITION_ENTRIES
        );
    }

    #[test]
    fn test_validated_keeps_explicit_cap() {
        let config = DispatchConfig {
            max_definition_entries: 16,
        }
        .validated();
        assert_eq!(config.max_definition_entries, 16);
    }
}
