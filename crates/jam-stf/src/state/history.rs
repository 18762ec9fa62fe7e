//! β: recent history plus the BEEFY Merkle-Mountain-Range belt (§4.11).

use crate::merkle::{super_peak, Mmr};
use crate::types::{Hash, TimeSlot};
use std::collections::VecDeque;

/// One recent block's descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub header_hash: Hash,
    pub beefy_root: Hash,
    /// Zero until the following block's import patches it in (§4.11
    /// step 3).
    pub state_root: Hash,
    /// Package hashes reported in this block, used for the duplicate
    /// checks in §4.7 rule 12.
    pub work_package_hashes: Vec<Hash>,
    pub slot: TimeSlot,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecentHistory {
    pub blocks: VecDeque<BlockInfo>,
    pub belt: Mmr,
}

impl RecentHistory {
    pub fn latest(&self) -> Option<&BlockInfo> {
        self.blocks.back()
    }

    pub fn latest_hash(&self) -> Hash {
        self.latest().map(|b| b.header_hash).unwrap_or_default()
    }

    /// Whether `hash` names a block still held in recent history.
    pub fn contains_hash(&self, hash: &Hash) -> bool {
        self.blocks.iter().any(|b| &b.header_hash == hash)
    }

    pub fn block_by_hash(&self, hash: &Hash) -> Option<&BlockInfo> {
        self.blocks.iter().find(|b| &b.header_hash == hash)
    }

    /// Whether a package hash appears anywhere in the retained history
    /// (§4.7 rule 12's "recent β" half of the duplicate check).
    pub fn has_package_hash(&self, hash: &Hash) -> bool {
        self.blocks
            .iter()
            .any(|b| b.work_package_hashes.contains(hash))
    }

    pub fn has_dependency_hash(&self, hash: &Hash) -> bool {
        self.contains_hash(hash) || self.has_package_hash(hash)
    }

    /// Append a new block descriptor, evicting the oldest once at depth
    /// `max_depth`, and patch the previous head's `state_root` with the
    /// incoming block's declared `parent_state_root` (§4.11 steps 1–3).
    pub fn append(
        &mut self,
        max_depth: usize,
        header_hash: Hash,
        slot: TimeSlot,
        parent_state_root: Hash,
        work_package_hashes: Vec<Hash>,
        accumulate_root: Hash,
    ) {
        if let Some(prev) = self.blocks.back_mut() {
            prev.state_root = parent_state_root;
        }

        self.belt.append::<crate::merkle::KeccakHasher>(accumulate_root);
        let beefy_root = super_peak(&self.belt);

        self.blocks.push_back(BlockInfo {
            header_hash,
            beefy_root,
            state_root: crate::types::ZERO_HASH,
            work_package_hashes,
            slot,
        });

        while self.blocks.len() > max_depth {
            self.blocks.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_evicts_oldest_past_depth() {
        let mut h = RecentHistory::default();
        for i in 0..6u8 {
            h.append(4, [i; 32], i as u32, [0u8; 32], vec![], [i; 32]);
        }
        assert_eq!(h.blocks.len(), 4);
        assert_eq!(h.blocks.front().unwrap().header_hash, [2u8; 32]);
    }

    #[test]
    fn append_patches_previous_state_root() {
        let mut h = RecentHistory::default();
        h.append(4, [1u8; 32], 1, [0u8; 32], vec![], [9u8; 32]);
        assert_eq!(h.blocks[0].state_root, crate::types::ZERO_HASH);
        h.append(4, [2u8; 32], 2, [7u8; 32], vec![], [9u8; 32]);
        assert_eq!(h.blocks[0].state_root, [7u8; 32]);
        assert_eq!(h.blocks[1].state_root, crate::types::ZERO_HASH);
    }

    #[test]
    fn super_peak_tracks_latest_beefy_root() {
        let mut h = RecentHistory::default();
        h.append(4, [1u8; 32], 1, [0u8; 32], vec![], [9u8; 32]);
        let expected = super_peak(&h.belt);
        assert_eq!(h.blocks.back().unwrap().beefy_root, expected);
    }
}
