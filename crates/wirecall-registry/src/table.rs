//! The outbound translation table: identity to wire code.
//!
//! The calling side owns one of these per session. It is rebuilt
//! wholesale every time a definitions batch arrives; nothing else ever
//! writes to it. A missing entry is the normal, expected answer before
//! the handshake lands (and for RPCs the peer simply does not expose),
//! so `lookup` returns an `Option`, not an error.
//!
//! # Concurrency note
//!
//! `TranslationTable` is a plain `HashMap` owner, not a concurrent
//! structure. All reads and replacements happen on the single logical
//! thread that drains network events, which is what makes
//! [`replace_all`](TranslationTable::replace_all) indivisible with
//! respect to [`lookup`](TranslationTable::lookup): there are no
//! concurrent writers to tear it. If dispatch is ever parallelized
//! across connections, wrap the table in a lock or swap it
//! copy-on-replace; a call in flight must never see a mix of old and
//! new wire codes.

use std::collections::HashMap;

use tracing::{debug, warn};
use wirecall_protocol::{RpcDefinition, RpcId, WireId};

/// Outbound-side mapping from [`RpcId`] to the server-assigned [`WireId`].
///
/// Hash-keyed because wire codes are assigned by the remote side in an
/// order unrelated to local call sites, and a lookup runs on every
/// outgoing call.
#[derive(Debug, Default)]
pub struct TranslationTable {
    entries: HashMap<RpcId, WireId>,
}

impl TranslationTable {
    /// Creates an empty table. Every lookup misses until the first
    /// [`replace_all`](Self::replace_all).
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the current wire code for an identity, if the server has
    /// assigned one this session.
    ///
    /// `None` means "this RPC cannot be invoked right now". Callers must
    /// treat it exactly that way: reject the call locally, and never
    /// substitute a fabricated or previously cached code.
    pub fn lookup(&self, id: RpcId) -> Option<WireId> {
        self.entries.get(&id).copied()
    }

    /// Discards the previous mapping entirely and installs `entries`.
    ///
    /// Wire codes are server-authoritative and may be renumbered between
    /// sessions or after a server-side reload, so batches replace, never
    /// merge: an identity absent from `entries` is gone afterwards even
    /// if it was mapped before. The new map is fully built before the
    /// old one is dropped, so no lookup can observe a half-applied
    /// state.
    ///
    /// A duplicate identity within one batch is a peer anomaly; the last
    /// entry wins and a warning is logged.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = RpcDefinition>) {
        let mut next = HashMap::new();
        for def in entries {
            if let Some(prev) = next.insert(def.id, def.wire_id) {
                warn!(
                    id = %def.id,
                    kept = %def.wire_id,
                    discarded = %prev,
                    "duplicate identity in definitions batch"
                );
            }
        }

        debug!(
            installed = next.len(),
            discarded = self.entries.len(),
            "translation table replaced"
        );
        self.entries = next;
    }

    /// Drops every entry.
    ///
    /// Called at session teardown and at the start of a reconnect: wire
    /// codes are meaningful only for the connection that issued them,
    /// and a stale entry surviving into a new session would misroute
    /// calls to unrelated functions.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(discarded = self.entries.len(), "translation table cleared");
        }
        self.entries.clear();
    }

    /// Number of currently mapped identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no identity is currently mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn def(klass: u64, function: u64, wire: u32) -> RpcDefinition {
        RpcDefinition {
            id: RpcId::new(klass, function),
            wire_id: WireId(wire),
        }
    }

    #[test]
    fn test_new_table_is_empty_and_misses() {
        let table = TranslationTable::new();
        assert!(table.is_empty());
        assert_eq!(table.lookup(RpcId::new(1, 2)), None);
    }

    #[test]
    fn test_replace_all_installs_every_entry() {
        let mut table = TranslationTable::new();
        table.replace_all([def(1, 2, 7), def(3, 4, 9)]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(RpcId::new(1, 2)), Some(WireId(7)));
        assert_eq!(table.lookup(RpcId::new(3, 4)), Some(WireId(9)));
        assert_eq!(table.lookup(RpcId::new(5, 6)), None);
    }

    #[test]
    fn test_second_replace_supersedes_first_completely() {
        // The scenario that matters for reconnects and hot reloads:
        // nothing from the first batch survives unless re-included.
        let mut table = TranslationTable::new();
        table.replace_all([def(1, 2, 7), def(3, 4, 9)]);
        table.replace_all([def(1, 2, 42)]);

        assert_eq!(table.lookup(RpcId::new(1, 2)), Some(WireId(42)));
        assert_eq!(table.lookup(RpcId::new(3, 4)), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_replace_all_with_empty_batch_empties_table() {
        let mut table = TranslationTable::new();
        table.replace_all([def(1, 2, 7)]);
        table.replace_all([]);

        assert!(table.is_empty());
        assert_eq!(table.lookup(RpcId::new(1, 2)), None);
    }

    #[test]
    fn test_duplicate_identity_in_batch_last_wins() {
        let mut table = TranslationTable::new();
        table.replace_all([def(1, 2, 7), def(1, 2, 8)]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(RpcId::new(1, 2)), Some(WireId(8)));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut table = TranslationTable::new();
        table.replace_all([def(1, 2, 7), def(3, 4, 9)]);
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.lookup(RpcId::new(1, 2)), None);
    }
}
