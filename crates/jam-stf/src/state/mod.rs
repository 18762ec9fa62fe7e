//! The sixteen named state components (§3) and their owning container.

pub mod disputes;
pub mod history;
pub mod report;
pub mod service;
pub mod stats;

use crate::config::Config;
use crate::types::{BandersnatchVrfRoot, Hash, SealerSeries, ServiceId, Ticket, TimeSlot, ValidatorKeys};
use disputes::Disputes;
use history::RecentHistory;
use report::{PendingReport, ReadyEntry};
use service::{Authorizations, Privileges, ServiceMap};
use stats::Statistics;
use std::collections::HashMap;

/// The full global state `S`. Every component is exclusively owned here;
/// the delta overlay (`delta.rs`) never holds a second owner of any of
/// this data, only a replacement value for components it has `ensure`d.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    /// τ: current slot.
    pub tau: TimeSlot,
    /// η: entropy buffer, η₀ (freshest) .. η₃ (oldest).
    pub eta: [Hash; 4],
    /// ι: next validator set.
    pub iota: Vec<ValidatorKeys>,
    /// κ: current validator set.
    pub kappa: Vec<ValidatorKeys>,
    /// λ: previous validator set.
    pub lambda: Vec<ValidatorKeys>,
    /// γ_k: pending next-epoch validators.
    pub gamma_k: Vec<ValidatorKeys>,
    /// γ_z: ring-VRF root commitment over γ_k's Bandersnatch keys.
    pub gamma_z: BandersnatchVrfRoot,
    /// γ_s: slot-sealer series for the current epoch.
    pub gamma_s: SealerSeries,
    /// γ_a: ticket accumulator, strictly increasing by id, length ≤ E.
    pub gamma_a: Vec<Ticket>,
    /// α / φ: per-core authorization pools and queues.
    pub authorizations: Authorizations,
    /// ρ: pending reports per core.
    pub rho: Vec<Option<PendingReport>>,
    /// β: recent history + BEEFY belt.
    pub beta: RecentHistory,
    /// δ: service accounts.
    pub delta: ServiceMap,
    /// χ: privileges.
    pub chi: Privileges,
    /// ψ: disputes.
    pub psi: Disputes,
    /// π: statistics.
    pub pi: Statistics,
    /// ϑ: ready queue, E lanes.
    pub vartheta: Vec<Vec<ReadyEntry>>,
    /// ξ: accumulated-package-hash queue, E lanes.
    pub xi: Vec<std::collections::HashSet<Hash>>,
    /// θ: last block's accumulation outputs.
    pub theta: Vec<(ServiceId, Hash)>,
}

impl State {
    /// An empty genesis state shaped by `config`, with `validators` seeded
    /// into ι/κ/λ/γ_k identically (a chain's first epoch has no prior
    /// rotation history).
    pub fn genesis(config: &Config, validators: Vec<ValidatorKeys>) -> Self {
        let core_count = config.core_count as usize;
        let epoch_length = config.epoch_length as usize;
        let gamma_z_keys: Vec<_> = validators.iter().map(|v| v.bandersnatch).collect();
        let gamma_z = crate::crypto::bandersnatch_ring_commitment(&gamma_z_keys).unwrap_or([0u8; 144]);
        State {
            tau: 0,
            eta: [Hash::default(); 4],
            iota: validators.clone(),
            kappa: validators.clone(),
            lambda: validators.clone(),
            gamma_k: validators.clone(),
            gamma_z,
            gamma_s: SealerSeries::Fallback(vec![Default::default(); epoch_length]),
            gamma_a: Vec::new(),
            authorizations: Authorizations::new(core_count, config.max_auth_queue_items),
            rho: vec![None; core_count],
            beta: RecentHistory::default(),
            delta: HashMap::new(),
            chi: Privileges::with_core_count(core_count),
            psi: Disputes::default(),
            pi: Statistics::with_shape(config.validator_count as usize, core_count),
            vartheta: vec![Vec::new(); epoch_length],
            xi: vec![std::collections::HashSet::new(); epoch_length],
            theta: Vec::new(),
        }
    }

    pub fn core_count(&self) -> usize {
        self.rho.len()
    }

    /// The state-merklization dictionary (§6): one byte component tag
    /// followed by a component-specific subkey, zero-padded to 32 bytes,
    /// mapped to that component's canonical encoding.
    pub fn merklization_entries(&self) -> Vec<(crate::types::StateKey, Vec<u8>)> {
        use crate::codec::serialize;

        let mut entries = Vec::new();
        let tag = |t: u8, sub: &[u8]| -> crate::types::StateKey {
            let mut key = [0u8; 32];
            key[0] = t;
            let n = sub.len().min(31);
            key[1..1 + n].copy_from_slice(&sub[..n]);
            key
        };

        entries.push((tag(0, &[]), serialize(&self.tau)));
        entries.push((tag(1, &[]), self.eta.iter().flatten().copied().collect()));
        entries.push((tag(2, &[]), serialize(&self.iota)));
        entries.push((tag(3, &[]), serialize(&self.kappa)));
        entries.push((tag(4, &[]), serialize(&self.lambda)));
        entries.push((tag(5, &[]), serialize(&self.gamma_k)));
        entries.push((tag(6, &[]), self.gamma_z.to_vec()));
        entries.push((tag(7, &[]), serialize(&self.gamma_s)));
        entries.push((tag(8, &[]), serialize(&self.gamma_a)));
        for (c, pool) in self.authorizations.pool.iter().enumerate() {
            entries.push((tag(9, &(c as u32).to_le_bytes()), serialize(pool)));
        }
        for (c, queue) in self.authorizations.queue.iter().enumerate() {
            entries.push((tag(10, &(c as u32).to_le_bytes()), serialize(queue)));
        }
        for (c, slot) in self.rho.iter().enumerate() {
            entries.push((tag(11, &(c as u32).to_le_bytes()), serialize(slot)));
        }
        entries.push((tag(12, &[]), serialize(&(self.beta.blocks.len() as u32))));
        entries.push((tag(12, b"latest"), self.beta.latest_hash().to_vec()));
        for (id, account) in &self.delta {
            entries.push((tag(13, &id.to_le_bytes()), serialize(account)));
        }
        entries.push((tag(14, &[]), serialize(&self.chi)));
        entries.push((tag(15, &[]), serialize(&self.psi)));
        for (lane, reports) in self.vartheta.iter().enumerate() {
            entries.push((tag(17, &(lane as u32).to_le_bytes()), serialize(&reports.iter().map(|e| e.report.package_hash).collect::<Vec<_>>())));
        }
        for (lane, hashes) in self.xi.iter().enumerate() {
            entries.push((tag(18, &(lane as u32).to_le_bytes()), serialize(hashes)));
        }
        entries.push((tag(19, &[]), serialize(&self.theta)));

        entries
    }

    pub fn root(&self) -> Hash {
        crate::merkle::m_sigma(&self.merklization_entries())
    }
}
