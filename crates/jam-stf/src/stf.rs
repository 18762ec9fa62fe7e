//! The STF driver: orders every sub-step deterministically per block
//! (§4.12).

use crate::accumulation::{self, Accumulator, DefaultAccumulator};
use crate::assurances;
use crate::authorizations;
use crate::block::Block;
use crate::codec::serialize;
use crate::config::Config;
use crate::delta::StateTransition;
use crate::disputes;
use crate::error::StfError;
use crate::header;
use crate::preimages;
use crate::reports;
use crate::safrole;
use crate::state::State;
use crate::types::Hash;

/// One block's applied outcome: the new state plus its merklization root.
pub struct Applied {
    pub state: State,
    pub state_root: Hash,
}

pub struct Stf;

impl Stf {
    /// Apply `block` to `base`, returning the new state or the first
    /// sub-step error encountered. On error, `base` is never touched — the
    /// overlay is simply dropped (§4.3, §5).
    pub fn apply(
        base: &State,
        cfg: &Config,
        block: &Block,
        entropy_contribution: Hash,
    ) -> Result<Applied, StfError> {
        Self::apply_with_accumulator(base, cfg, block, entropy_contribution, &mut DefaultAccumulator)
    }

    pub fn apply_with_accumulator(
        base: &State,
        cfg: &Config,
        block: &Block,
        entropy_contribution: Hash,
        accumulator: &mut dyn Accumulator,
    ) -> Result<Applied, StfError> {
        let span = tracing::info_span!("apply_block", slot = block.header.slot, parent = %hex_prefix(&block.header.parent));
        let _guard = span.enter();
        match Self::apply_inner(base, cfg, block, entropy_contribution, accumulator) {
            Ok(applied) => {
                tracing::info!(state_root = %hex_prefix(&applied.state_root), "block applied");
                Ok(applied)
            }
            Err(err) => {
                tracing::warn!(error = %err, "block rejected");
                Err(err)
            }
        }
    }

    fn apply_inner(
        base: &State,
        cfg: &Config,
        block: &Block,
        entropy_contribution: Hash,
        accumulator: &mut dyn Accumulator,
    ) -> Result<Applied, StfError> {
        let mut delta = StateTransition::new(base);
        let extrinsic_bytes = serialize(&block.extrinsic);
        let pre_state_entries = base.merklization_entries();

        // 1. Structural/timing/author checks.
        tracing::debug!(step = "header.structural");
        header::check_structural(&block.header, &delta, &extrinsic_bytes, &pre_state_entries)?;

        let parent_header_hash = block.header.parent;
        let tau_before = *delta.get_tau();
        let is_new_epoch = crate::time::Time::new(tau_before, block.header.slot).is_new_epoch(cfg);

        // 2. Time transition + Safrole rotation.
        tracing::debug!(step = "safrole", new_epoch = is_new_epoch);
        let safrole_outcome = safrole::process(
            &mut delta,
            cfg,
            block.header.slot,
            entropy_contribution,
            &block.extrinsic.tickets,
        )?;
        *delta.ensure_tau() = block.header.slot;

        if is_new_epoch {
            delta
                .ensure_pi()
                .roll_epoch(cfg.validator_count as usize, cfg.core_count as usize);
        }

        header::check_markers(&block.header, &safrole_outcome)?;

        // 3. Disputes.
        tracing::debug!(step = "disputes");
        disputes::process(&mut delta, cfg, &block.extrinsic.disputes)?;

        // 4. Reports / guarantees.
        tracing::debug!(step = "reports", count = block.extrinsic.guarantees.len());
        reports::process(&mut delta, cfg, block.header.slot, &block.extrinsic.guarantees)?;

        // 4a. Preimages.
        tracing::debug!(step = "preimages", count = block.extrinsic.preimages.len());
        preimages::process(&mut delta, block.header.slot, &block.extrinsic.preimages)?;

        // 5. Assurances.
        tracing::debug!(step = "assurances", count = block.extrinsic.assurances.len());
        let available = assurances::process(
            &mut delta,
            cfg,
            block.header.slot,
            parent_header_hash,
            &block.extrinsic.assurances,
        )?;

        // 6. Accumulation.
        tracing::debug!(step = "accumulation", newly_available = available.len());
        let accumulation_outcome = accumulation::process(
            &mut delta,
            cfg,
            block.header.slot,
            is_new_epoch,
            available,
            accumulator,
        )?;

        // 7. Authorizations.
        tracing::debug!(step = "authorizations");
        let reported_auth: Vec<(u16, Hash)> = block
            .extrinsic
            .guarantees
            .iter()
            .map(|g| (g.report.core_index, g.report.authorizer_hash))
            .collect();
        authorizations::process(&mut delta, cfg, block.header.slot, &reported_auth)?;

        // 8. Recent-history append.
        tracing::debug!(step = "recent_history");
        let package_hashes: Vec<Hash> = block
            .extrinsic
            .guarantees
            .iter()
            .map(|g| g.report.package_hash)
            .collect();
        delta.ensure_beta().append(
            cfg.recent_history_depth,
            block_header_hash(&block.header),
            block.header.slot,
            block.header.parent_state_root,
            package_hashes,
            accumulation_outcome.accumulate_root,
        );

        // 9. Seal + entropy-source verification.
        tracing::debug!(step = "seal_and_entropy");
        header::check_seal_and_entropy(&block.header, &delta, is_new_epoch)?;

        // 10. Merge and compute the new root.
        tracing::debug!(step = "merge");
        let state = delta.merge_prime_onto_base();
        let state_root = state.root();

        Ok(Applied { state, state_root })
    }
}

fn block_header_hash(header: &crate::block::Header) -> Hash {
    crate::merkle::blake2b_256(&serialize(header))
}

fn hex_prefix(bytes: &Hash) -> String {
    hex::encode(&bytes[..4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Extrinsic, Header};
    use crate::types::ValidatorKeys;

    fn genesis_block(cfg: &Config, base: &State, slot: u32) -> Block {
        let header = Header {
            parent: base.beta.latest_hash(),
            parent_state_root: base.root(),
            extrinsic_hash: crate::merkle::blake2b_256(&serialize(&Extrinsic::default())),
            slot,
            epoch_mark: None,
            tickets_mark: None,
            author_index: 0,
            entropy_source: [0u8; 96],
            seal: [0u8; 96],
        };
        Block {
            header,
            extrinsic: Extrinsic::default(),
        }
    }

    #[test]
    fn empty_block_fails_seal_verification_with_zeroed_keys() {
        // Without real VRF key material the seal/entropy checks cannot
        // succeed; this exercises every earlier sub-step and confirms the
        // driver reaches the final cryptographic gate deterministically.
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let block = genesis_block(&cfg, &base, 1);
        let err = Stf::apply(&base, &cfg, &block, [0u8; 32]).unwrap_err();
        assert!(matches!(err, StfError::Header(_)));
    }

    #[test]
    fn bad_slot_is_rejected_before_any_mutation() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let mut block = genesis_block(&cfg, &base, 0);
        block.header.slot = 0;
        let err = Stf::apply(&base, &cfg, &block, [0u8; 32]).unwrap_err();
        assert!(matches!(err, StfError::Header(_)));
        assert_eq!(base.tau, 0);
    }
}
