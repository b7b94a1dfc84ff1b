//! Server-side wire code numbering.
//!
//! The server is the sole authority over which compact code stands for
//! which identity. Codes are assigned in one pass over the callable set
//! and hold only until the next renumbering; nothing about them is
//! stable across sessions or reloads, and peers must treat every
//! definitions batch as a fresh world.

use std::collections::HashMap;

use tracing::{debug, warn};
use wirecall_protocol::{RpcDefinition, RpcDefinitions, RpcId, WireId};

/// Assigns session-scoped wire codes to RPC identities.
///
/// Keeps both directions of the mapping: `forward` answers "what code
/// did this identity get" when encoding definitions and outbound calls,
/// `reverse` answers "which identity does this inbound code name" on
/// the per-call path. Codes are dense from zero, so the reverse side is
/// a plain vector indexed by code.
#[derive(Debug, Default)]
pub struct WireAssigner {
    forward: HashMap<RpcId, WireId>,
    reverse: Vec<RpcId>,
    generation: u64,
}

impl WireAssigner {
    /// Creates an assigner with no codes handed out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers the given identities from zero and discards every prior
    /// assignment.
    ///
    /// Old codes mean nothing afterwards; callers must push a fresh
    /// definitions batch to every live peer or their translated calls
    /// will land on the wrong functions. Duplicate identities in the
    /// input keep their first code and are logged.
    pub fn assign(&mut self, ids: impl IntoIterator<Item = RpcId>) {
        let mut forward = HashMap::new();
        let mut reverse = Vec::new();

        for id in ids {
            if forward.contains_key(&id) {
                warn!(%id, "duplicate identity in assignment batch, keeping first code");
                continue;
            }
            let code = WireId(reverse.len() as u32);
            forward.insert(id, code);
            reverse.push(id);
        }

        self.generation = self.generation.wrapping_add(1);
        self.forward = forward;
        self.reverse = reverse;
        debug!(
            assigned = self.reverse.len(),
            generation = self.generation,
            "wire codes assigned"
        );
    }

    /// The code currently standing for `id`, if it was in the last
    /// assignment batch.
    pub fn wire_id(&self, id: RpcId) -> Option<WireId> {
        self.forward.get(&id).copied()
    }

    /// The identity an inbound `code` names under the current
    /// assignment, or `None` for a code from no (or a previous)
    /// generation.
    pub fn identity(&self, code: WireId) -> Option<RpcId> {
        self.reverse.get(code.0 as usize).copied()
    }

    /// Snapshot of the current assignment as a definitions batch, ready
    /// to encode and send to a peer.
    pub fn definitions(&self) -> RpcDefinitions {
        RpcDefinitions {
            entries: self
                .reverse
                .iter()
                .enumerate()
                .map(|(code, id)| RpcDefinition {
                    id: *id,
                    wire_id: WireId(code as u32),
                })
                .collect(),
        }
    }

    /// Monotonic count of assignment passes. Bumps on every
    /// [`assign`](Self::assign), including reassignments of an identical
    /// set.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of identities holding a code.
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// `true` before the first assignment or after assigning an empty set.
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_dense_from_zero() {
        let mut assigner = WireAssigner::new();
        assigner.assign([RpcId::new(1, 2), RpcId::new(3, 4), RpcId::new(5, 6)]);

        assert_eq!(assigner.wire_id(RpcId::new(1, 2)), Some(WireId(0)));
        assert_eq!(assigner.wire_id(RpcId::new(3, 4)), Some(WireId(1)));
        assert_eq!(assigner.wire_id(RpcId::new(5, 6)), Some(WireId(2)));
        assert_eq!(assigner.len(), 3);
    }

    #[test]
    fn test_reverse_lookup_matches_forward() {
        let mut assigner = WireAssigner::new();
        assigner.assign([RpcId::new(1, 2), RpcId::new(3, 4)]);

        for id in [RpcId::new(1, 2), RpcId::new(3, 4)] {
            let code = assigner.wire_id(id).unwrap();
            assert_eq!(assigner.identity(code), Some(id));
        }
        assert_eq!(assigner.identity(WireId(99)), None);
    }

    #[test]
    fn test_reassignment_discards_previous_codes() {
        let mut assigner = WireAssigner::new();
        assigner.assign([RpcId::new(1, 2), RpcId::new(3, 4)]);
        assigner.assign([RpcId::new(3, 4)]);

        assert_eq!(assigner.wire_id(RpcId::new(1, 2)), None);
        assert_eq!(assigner.wire_id(RpcId::new(3, 4)), Some(WireId(0)));
        assert_eq!(assigner.identity(WireId(1)), None);
    }

    #[test]
    fn test_generation_bumps_per_assignment() {
        let mut assigner = WireAssigner::new();
        assert_eq!(assigner.generation(), 0);

        assigner.assign([RpcId::new(1, 2)]);
        assert_eq!(assigner.generation(), 1);

        // Same set again still counts as a new generation.
        assigner.assign([RpcId::new(1, 2)]);
        assert_eq!(assigner.generation(), 2);
    }

    #[test]
    fn test_duplicate_identity_keeps_first_code() {
        let mut assigner = WireAssigner::new();
        assigner.assign([RpcId::new(1, 2), RpcId::new(1, 2), RpcId::new(3, 4)]);

        assert_eq!(assigner.len(), 2);
        assert_eq!(assigner.wire_id(RpcId::new(1, 2)), Some(WireId(0)));
        assert_eq!(assigner.wire_id(RpcId::new(3, 4)), Some(WireId(1)));
    }

    #[test]
    fn test_definitions_snapshot_round_trips_assignment() {
        let mut assigner = WireAssigner::new();
        assigner.assign([RpcId::new(1, 2), RpcId::new(3, 4)]);

        let defs = assigner.definitions();
        assert_eq!(defs.entries.len(), 2);
        for entry in &defs.entries {
            assert_eq!(assigner.wire_id(entry.id), Some(entry.wire_id));
        }
    }

    #[test]
    fn test_empty_assignment_empties_the_assigner() {
        let mut assigner = WireAssigner::new();
        assigner.assign([RpcId::new(1, 2)]);
        assigner.assign(std::iter::empty());

        assert!(assigner.is_empty());
        assert!(assigner.definitions().entries.is_empty());
        assert_eq!(assigner.generation(), 2);
    }
}
