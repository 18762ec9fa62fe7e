//! Accumulation: dequeue available reports, invoke the (opaque) PVM per
//! service, and settle ready/accumulated queues (§4.9).

use crate::config::Config;
use crate::delta::StateTransition;
use crate::error::AccumulationError;
use crate::merkle::m_sigma;
use crate::state::report::{ReadyEntry, WorkReport};
use crate::types::{Gas, Hash, ServiceId, TimeSlot};

/// The concrete effect of successfully accumulating one service item
/// (§4.9 step 3, "apply successful results to δ"): the gas actually
/// charged, the output hash folded into θ′, and the mutations the opaque
/// PVM declares against its own account. A failed or out-of-gas
/// invocation still charges `gas_used` but leaves every other field at
/// its no-op default.
pub struct AccumulationEffect {
    pub gas_used: Gas,
    pub output_hash: Option<Hash>,
    pub new_code_hash: Option<Hash>,
    pub new_storage_root: Option<Hash>,
    pub balance_delta: i64,
    pub byte_delta: i64,
    pub item_delta: i32,
}

/// The PVM invocation boundary (§1: "the STF calls it as an opaque
/// function returning `(gas_used, result | failure)`"). A production node
/// wires a real PVM here; tests and the harness's default run a
/// deterministic stand-in. `gas_limit` is the caller's remaining budget
/// for this invocation, independent of the result's own declared
/// `accumulate_gas` — the two only coincide when the budget isn't
/// exhausted.
pub trait Accumulator {
    fn invoke(
        &mut self,
        service: &crate::state::service::ServiceAccount,
        result: &crate::state::report::WorkResult,
        gas_limit: Gas,
    ) -> AccumulationEffect;
}

/// Deterministic stand-in: succeeds whenever the declared gas fits the
/// limit, deriving its output hash from the code and payload hashes
/// already carried by the work-result, and committing that hash as the
/// service's new storage root.
#[derive(Default)]
pub struct DefaultAccumulator;

impl Accumulator for DefaultAccumulator {
    fn invoke(
        &mut self,
        _service: &crate::state::service::ServiceAccount,
        result: &crate::state::report::WorkResult,
        gas_limit: Gas,
    ) -> AccumulationEffect {
        if result.accumulate_gas > gas_limit {
            return AccumulationEffect {
                gas_used: gas_limit,
                output_hash: None,
                new_code_hash: None,
                new_storage_root: None,
                balance_delta: 0,
                byte_delta: 0,
                item_delta: 0,
            };
        }
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&result.code_hash);
        buf.extend_from_slice(&result.payload_hash);
        let output_hash = crate::merkle::blake2b_256(&buf);
        AccumulationEffect {
            gas_used: result.accumulate_gas,
            output_hash: Some(output_hash),
            new_code_hash: None,
            new_storage_root: Some(output_hash),
            balance_delta: 0,
            byte_delta: 32,
            item_delta: 1,
        }
    }
}

pub struct AccumulationOutcome {
    pub theta_prime: Vec<(ServiceId, Hash)>,
    pub accumulate_root: Hash,
}

pub fn process(
    delta: &mut StateTransition,
    cfg: &Config,
    current_slot: TimeSlot,
    is_new_epoch: bool,
    newly_available: Vec<WorkReport>,
    accumulator: &mut dyn Accumulator,
) -> Result<AccumulationOutcome, AccumulationError> {
    let epoch_length = cfg.epoch_length as usize;
    let lane = (current_slot as usize) % epoch_length;

    for report in newly_available {
        let dependencies = report.dependencies();
        delta.ensure_vartheta()[lane].push(ReadyEntry { report, dependencies });
    }

    if is_new_epoch {
        let xi = delta.ensure_xi();
        xi.rotate_left(1);
        if let Some(last) = xi.last_mut() {
            last.clear();
        }
    }

    // Privileged always-accumulate services run every block, ahead of the
    // ready queue, with an empty work-result set up to their configured
    // gas. Their own configured gas is their budget — there is no shared
    // per-core pool to draw down since they aren't tied to a core.
    let always_accumulate = delta.get_chi().always_accumulate.clone();
    for (service_id, gas_limit) in &always_accumulate {
        let service = delta
            .get_delta()
            .get(service_id)
            .ok_or(AccumulationError::UnknownService)?
            .clone();
        let privileged_result = crate::state::report::WorkResult {
            service_id: *service_id,
            code_hash: service.code_hash,
            payload_hash: Hash::default(),
            accumulate_gas: *gas_limit,
            output: crate::state::report::WorkOutput::Success {
                gas_used: 0,
                output_hash: Hash::default(),
            },
        };
        let effect = accumulator.invoke(&service, &privileged_result, *gas_limit);
        delta.ensure_pi().record_service_accumulation(*service_id, effect.gas_used);
    }

    let accumulated_so_far: std::collections::HashSet<Hash> = delta
        .get_xi()
        .iter()
        .flat_map(|lane| lane.iter().copied())
        .collect();

    let mut ready_reports = Vec::new();
    for l in 0..epoch_length {
        let lane_entries = std::mem::take(&mut delta.ensure_vartheta()[l]);
        let (ready, pending): (Vec<_>, Vec<_>) = lane_entries
            .into_iter()
            .partition(|entry| entry.dependencies.iter().all(|d| accumulated_so_far.contains(d)));
        delta.ensure_vartheta()[l] = pending;
        ready_reports.extend(ready.into_iter().map(|e| e.report));
    }

    // Each core's accumulate-gas budget for this block is independent of
    // any one result's declared `accumulate_gas` (§4.9 step 2): it is the
    // ceiling the core's results collectively draw down, not a value
    // compared against itself.
    let mut core_gas_remaining = vec![cfg.max_gas_per_core; delta.base().core_count()];

    let mut theta_prime = Vec::new();
    let mut newest_accumulated = std::collections::HashSet::new();
    for report in &ready_reports {
        newest_accumulated.insert(report.package_hash);
        let core = report.core_index as usize;
        for result in &report.results {
            let service_id = result.service_id;
            let service = delta
                .get_delta()
                .get(&service_id)
                .ok_or(AccumulationError::UnknownService)?
                .clone();
            let gas_limit = core_gas_remaining.get(core).copied().unwrap_or(0);
            let effect = accumulator.invoke(&service, result, gas_limit);
            if let Some(remaining) = core_gas_remaining.get_mut(core) {
                *remaining = remaining.saturating_sub(effect.gas_used);
            }
            delta.ensure_pi().record_service_accumulation(service_id, effect.gas_used);

            if let Some(output_hash) = effect.output_hash {
                theta_prime.push((service_id, output_hash));
                if let Some(account) = delta.ensure_delta().get_mut(&service_id) {
                    if let Some(new_code_hash) = effect.new_code_hash {
                        account.code_hash = new_code_hash;
                    }
                    if let Some(new_storage_root) = effect.new_storage_root {
                        account.storage_root = new_storage_root;
                    }
                    account.balance = (account.balance as i64 + effect.balance_delta).max(0) as u64;
                    account.byte_count = (account.byte_count as i64 + effect.byte_delta).max(0) as u64;
                    account.item_count = (account.item_count as i64 + effect.item_delta as i64).max(0) as u32;
                }
            }
        }
    }

    if let Some(last) = delta.ensure_xi().last_mut() {
        last.extend(newest_accumulated);
    }

    let entries: Vec<([u8; 32], Vec<u8>)> = theta_prime
        .iter()
        .map(|(service_id, hash)| {
            let mut key = [0u8; 32];
            key[..4].copy_from_slice(&service_id.to_le_bytes());
            (key, hash.to_vec())
        })
        .collect();
    let accumulate_root = m_sigma(&entries);

    *delta.ensure_theta() = theta_prime.clone();

    Ok(AccumulationOutcome {
        theta_prime,
        accumulate_root,
    })
}
