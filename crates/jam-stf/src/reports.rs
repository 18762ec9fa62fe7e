//! Reports / guarantees: work-report admission onto ρ (§4.7).

use crate::config::Config;
use crate::crypto::verify_ed25519;
use crate::delta::StateTransition;
use crate::error::ReportsError;
use crate::merkle::blake2b_256;
use crate::state::report::{Guarantee, PendingReport};
use crate::types::{CoreIndex, Hash, TimeSlot, ValidatorKeys};

const AVAILABLE_CONTEXT: &[u8] = b"jam_available";

/// Rotation-derived guarantor→core assignment: validator `v` is assigned
/// to core `(v + rotation_offset) mod core_count`, where
/// `rotation_offset` is derived from current entropy (§4.7 rule 8).
fn rotation_assignment(entropy: &Hash, validator_count: usize, core_count: usize) -> Vec<usize> {
    let offset = if core_count == 0 {
        0
    } else {
        (u32::from_le_bytes([entropy[0], entropy[1], entropy[2], entropy[3]]) as usize) % core_count
    };
    (0..validator_count)
        .map(|v| if core_count == 0 { 0 } else { (v + offset) % core_count })
        .collect()
}

pub fn process(
    delta: &mut StateTransition,
    cfg: &Config,
    current_slot: TimeSlot,
    guarantees: &[Guarantee],
) -> Result<Vec<Hash>, ReportsError> {
    // 1. Core-index strictly increasing.
    for pair in guarantees.windows(2) {
        if pair[0].report.core_index >= pair[1].report.core_index {
            return Err(ReportsError::OutOfOrderGuarantee);
        }
    }

    let core_count = delta.base().core_count();
    let entropy = delta.get_eta()[0];
    let kappa = delta.get_kappa().clone();
    let lambda = delta.get_lambda().clone();
    let assignment = rotation_assignment(&entropy, kappa.len(), core_count);

    let mut reported_package_hashes = Vec::new();
    let mut batch_hashes: std::collections::HashSet<Hash> = std::collections::HashSet::new();

    for guarantee in guarantees {
        validate_one(
            delta,
            cfg,
            current_slot,
            guarantee,
            &kappa,
            &lambda,
            &assignment,
            &batch_hashes,
        )?;
        batch_hashes.insert(guarantee.report.package_hash);
    }

    for guarantee in guarantees {
        let core = guarantee.report.core_index as usize;
        delta.ensure_rho()[core] = Some(PendingReport {
            report: guarantee.report.clone(),
            timeout: current_slot,
        });
        delta
            .ensure_pi()
            .record_core_report(core as CoreIndex, guarantee.report.serialized_output_size() as u64, guarantee.report.total_accumulate_gas());
        reported_package_hashes.push(guarantee.report.package_hash);
    }

    Ok(reported_package_hashes)
}

fn validate_one(
    delta: &StateTransition,
    cfg: &Config,
    current_slot: TimeSlot,
    guarantee: &Guarantee,
    kappa: &[ValidatorKeys],
    lambda: &[ValidatorKeys],
    assignment: &[usize],
    batch_hashes: &std::collections::HashSet<Hash>,
) -> Result<(), ReportsError> {
    let report = &guarantee.report;

    // 1.
    if report.core_index as usize >= delta.base().core_count() {
        return Err(ReportsError::BadCoreIndex);
    }

    // 2.
    if report.serialized_output_size() > cfg.max_work_report_size {
        return Err(ReportsError::WorkReportTooBig);
    }

    // 3.
    let total_gas = report.total_accumulate_gas();
    if total_gas > cfg.max_gas_per_core {
        return Err(ReportsError::WorkReportGasTooHigh);
    }
    for result in &report.results {
        let service = delta
            .get_delta()
            .get(&result.service_id)
            .ok_or(ReportsError::BadServiceId)?;
        if result.code_hash != service.code_hash {
            return Err(ReportsError::BadCodeHash);
        }
        if result.accumulate_gas < service.min_gas_accumulate {
            return Err(ReportsError::ServiceItemGasTooLow);
        }
    }

    // 4.
    if report.dependencies().len() > cfg.max_dependencies {
        return Err(ReportsError::TooManyDependencies);
    }

    // 5.
    if report.slot > current_slot {
        return Err(ReportsError::FutureReportSlot);
    }
    if report.slot / cfg.epoch_length + 1 < current_slot / cfg.epoch_length {
        return Err(ReportsError::ReportEpochBeforeLast);
    }

    // 6.
    let beta = delta.get_beta();
    let anchor_block = beta
        .block_by_hash(&report.anchor)
        .ok_or(ReportsError::AnchorNotRecent)?;
    if anchor_block.header_hash != report.anchor {
        return Err(ReportsError::BadAnchor);
    }
    if anchor_block.state_root != report.anchor_state_root && anchor_block.state_root != crate::types::ZERO_HASH {
        return Err(ReportsError::BadStateRoot);
    }
    if anchor_block.beefy_root != report.anchor_beefy_root {
        return Err(ReportsError::BadBeefyMmrRoot);
    }

    // 7. Signature count must lie in [V_s, V].
    let signature_count = guarantee.signatures.len();
    if signature_count < cfg.supermajority() {
        return Err(ReportsError::InsufficientGuarantees);
    }
    if signature_count > cfg.validator_count as usize {
        return Err(ReportsError::TooManyGuarantees);
    }
    for pair in guarantee.signatures.windows(2) {
        if pair[0].validator_index >= pair[1].validator_index {
            return Err(ReportsError::NotSortedOrUniqueGuarantors);
        }
    }
    let same_rotation = report.slot / cfg.rotation_period == current_slot / cfg.rotation_period;
    let validators = if same_rotation { kappa } else { lambda };
    let report_bytes = crate::codec::serialize(report);
    let digest = blake2b_256(&report_bytes);
    let mut message = Vec::with_capacity(AVAILABLE_CONTEXT.len() + 32);
    message.extend_from_slice(AVAILABLE_CONTEXT);
    message.extend_from_slice(&digest);
    for sig in &guarantee.signatures {
        let idx = sig.validator_index as usize;
        let key = validators.get(idx).ok_or(ReportsError::BadValidatorIndex)?;
        verify_ed25519(&key.ed25519, &message, &sig.signature).map_err(|_| ReportsError::BadSignature)?;

        // 8. assignment check.
        if assignment.get(idx).copied() != Some(report.core_index as usize) {
            return Err(ReportsError::WrongAssignment);
        }
    }

    // 10.
    for dep in report.dependencies() {
        if !beta.has_dependency_hash(&dep) {
            return Err(ReportsError::DependencyMissing);
        }
    }

    // 11.
    if let Some(pending) = &delta.get_rho()[report.core_index as usize] {
        if current_slot < pending.timeout + cfg.work_report_timeout {
            return Err(ReportsError::CoreEngaged);
        }
    }

    // 12.
    if beta.has_package_hash(&report.package_hash) || batch_hashes.contains(&report.package_hash) {
        return Err(ReportsError::DuplicatePackage);
    }

    // 13.
    let pool = &delta.get_authorizations().pool[report.core_index as usize];
    if !pool.contains(&report.authorizer_hash) {
        return Err(ReportsError::CoreUnauthorized);
    }

    Ok(())
}
