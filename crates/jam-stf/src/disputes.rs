//! Disputes extrinsic processing: verdicts, culprits, faults, and core
//! invalidation (§4.6).

use crate::block::{Culprit, DisputesExtrinsic, Fault, Verdict};
use crate::config::Config;
use crate::crypto::verify_ed25519;
use crate::delta::StateTransition;
use crate::error::DisputesError;
use crate::types::Hash;

const VALID_CONTEXT: &[u8] = b"jam_valid";
const INVALID_CONTEXT: &[u8] = b"jam_invalid";

/// Ed25519 keys accumulated into ψ.punish this block, returned for the
/// `offenders_mark` output (§4.6).
pub type OffendersMark = Vec<Hash>;

pub fn process(
    delta: &mut StateTransition,
    cfg: &Config,
    disputes: &DisputesExtrinsic,
) -> Result<OffendersMark, DisputesError> {
    let kappa = delta.get_kappa().clone();
    let lambda = delta.get_lambda().clone();
    let tau = *delta.get_tau();

    for verdict in &disputes.verdicts {
        verify_verdict(verdict, cfg, &kappa, &lambda, tau)?;
        classify_verdict(delta, verdict)?;
    }

    let mut offenders = Vec::new();
    for culprit in &disputes.culprits {
        offenders.extend(process_culprit(delta, culprit)?);
    }
    for fault in &disputes.faults {
        offenders.extend(process_fault(delta, &kappa, &lambda, tau, fault)?);
    }

    // Clear any core whose pending report just entered the bad set.
    let bad = delta.get_psi().bad.clone();
    let core_count = delta.base().core_count();
    for c in 0..core_count {
        let clear = delta
            .get_rho()
            .get(c)
            .and_then(|slot| slot.as_ref())
            .map(|p| bad.contains(&p.report.package_hash))
            .unwrap_or(false);
        if clear {
            delta.ensure_rho()[c] = None;
        }
    }

    Ok(offenders)
}

fn verify_verdict(
    verdict: &Verdict,
    cfg: &Config,
    kappa: &[crate::types::ValidatorKeys],
    lambda: &[crate::types::ValidatorKeys],
    tau: crate::types::TimeSlot,
) -> Result<(), DisputesError> {
    if verdict.votes.len() < cfg.supermajority() {
        return Err(DisputesError::InsufficientVotes);
    }
    for pair in verdict.votes.windows(2) {
        if pair[0].validator_index >= pair[1].validator_index {
            return Err(DisputesError::BadSignatures);
        }
    }
    let validators = if in_current_rotation(verdict.age, tau, cfg) {
        kappa
    } else {
        lambda
    };
    for vote in &verdict.votes {
        if vote.validator_index as usize >= validators.len() {
            return Err(DisputesError::BadSignatures);
        }
        let key = &validators[vote.validator_index as usize].ed25519;
        let context = if vote.vote { VALID_CONTEXT } else { INVALID_CONTEXT };
        let mut message = Vec::with_capacity(context.len() + 32);
        message.extend_from_slice(context);
        message.extend_from_slice(&verdict.target);
        verify_ed25519(key, &message, &vote.signature).map_err(|_| DisputesError::BadSignatures)?;
    }
    Ok(())
}

fn in_current_rotation(age: u32, tau: crate::types::TimeSlot, cfg: &Config) -> bool {
    age / cfg.rotation_period == tau / cfg.rotation_period
}

fn classify_verdict(delta: &mut StateTransition, verdict: &Verdict) -> Result<(), DisputesError> {
    if delta.get_psi().classification(&verdict.target).is_some() {
        return Err(DisputesError::SetConflict);
    }
    let valid_votes = verdict.votes.iter().filter(|v| v.vote).count();
    let total = verdict.votes.len();
    let psi = delta.ensure_psi();
    if valid_votes == 0 {
        psi.bad.insert(verdict.target);
    } else if valid_votes == total {
        psi.good.insert(verdict.target);
    } else {
        psi.wonky.insert(verdict.target);
    }
    Ok(())
}

fn process_culprit(delta: &mut StateTransition, culprit: &Culprit) -> Result<Vec<Hash>, DisputesError> {
    if !delta.get_psi().bad.contains(&culprit.target) {
        return Err(DisputesError::UnknownCulpritTarget);
    }
    let mut message = Vec::with_capacity(INVALID_CONTEXT.len() + 32);
    message.extend_from_slice(INVALID_CONTEXT);
    message.extend_from_slice(&culprit.target);
    verify_ed25519(&culprit.key, &message, &culprit.signature).map_err(|_| DisputesError::BadSignatures)?;
    delta.ensure_psi().punish.insert(culprit.key);
    Ok(vec![culprit.key])
}

fn process_fault(
    delta: &mut StateTransition,
    kappa: &[crate::types::ValidatorKeys],
    lambda: &[crate::types::ValidatorKeys],
    tau: crate::types::TimeSlot,
    fault: &Fault,
) -> Result<Vec<Hash>, DisputesError> {
    if !delta.get_psi().good.contains(&fault.target) {
        return Err(DisputesError::UnknownFaultTarget);
    }
    // Unlike a verdict's vote, a fault carries no rotation `age`, so its
    // key is checked against both sets that are valid at `tau` rather than
    // one selected the way `verify_verdict` picks between κ and λ.
    let _ = tau;
    if !kappa.iter().any(|v| v.ed25519 == fault.key) && !lambda.iter().any(|v| v.ed25519 == fault.key) {
        return Err(DisputesError::UnknownValidatorKey);
    }
    // A report in ψ.good is, by construction, unanimously valid — a fault
    // against it is only meaningful if it dissents from that.
    if fault.vote {
        return Err(DisputesError::FaultDoesNotDissent);
    }
    let mut message = Vec::with_capacity(INVALID_CONTEXT.len() + 32);
    message.extend_from_slice(INVALID_CONTEXT);
    message.extend_from_slice(&fault.target);
    verify_ed25519(&fault.key, &message, &fault.signature).map_err(|_| DisputesError::BadSignatures)?;
    delta.ensure_psi().punish.insert(fault.key);
    Ok(vec![fault.key])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use crate::types::ValidatorKeys;
    use ed25519_dalek::SigningKey;

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn validator_set(count: u16) -> Vec<ValidatorKeys> {
        (0..count)
            .map(|i| ValidatorKeys {
                ed25519: signing_key(i as u8 + 1).verifying_key().to_bytes(),
                ..ValidatorKeys::default()
            })
            .collect()
    }

    fn unanimous_valid_verdict(cfg: &Config, target: Hash) -> Verdict {
        let mut message = Vec::with_capacity(VALID_CONTEXT.len() + 32);
        message.extend_from_slice(VALID_CONTEXT);
        message.extend_from_slice(&target);
        let votes = (0u16..cfg.supermajority() as u16)
            .map(|idx| {
                let key = signing_key(idx as u8 + 1);
                let sig = key.sign(&message);
                crate::block::VoteSignature {
                    validator_index: idx,
                    vote: true,
                    signature: sig.to_bytes(),
                }
            })
            .collect();
        Verdict { target, age: 0, votes }
    }

    #[test]
    fn verdict_without_the_minimum_vote_count_is_rejected() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let mut delta = StateTransition::new(&base);
        let verdict = Verdict {
            target: [7u8; 32],
            age: 0,
            votes: vec![],
        };
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![verdict],
            culprits: vec![],
            faults: vec![],
        };
        let err = process(&mut delta, &cfg, &extrinsic).unwrap_err();
        assert_eq!(err, DisputesError::InsufficientVotes);
    }

    #[test]
    fn fault_agreeing_with_the_good_set_does_not_dissent() {
        let cfg = Config::tiny();
        let mut base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        base.psi.good.insert([7u8; 32]);
        let mut delta = StateTransition::new(&base);
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![],
            culprits: vec![],
            faults: vec![Fault {
                target: [7u8; 32],
                vote: true,
                key: base.kappa[0].ed25519,
                signature: [0u8; 64],
            }],
        };
        let err = process(&mut delta, &cfg, &extrinsic).unwrap_err();
        assert_eq!(err, DisputesError::FaultDoesNotDissent);
    }

    #[test]
    fn fault_from_a_non_validator_key_is_rejected() {
        let cfg = Config::tiny();
        let mut base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        base.psi.good.insert([7u8; 32]);
        let mut delta = StateTransition::new(&base);
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![],
            culprits: vec![],
            faults: vec![Fault {
                target: [7u8; 32],
                vote: false,
                key: [42u8; 32],
                signature: [0u8; 64],
            }],
        };
        let err = process(&mut delta, &cfg, &extrinsic).unwrap_err();
        assert_eq!(err, DisputesError::UnknownValidatorKey);
    }

    #[test]
    fn duplicate_classification_is_rejected() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, validator_set(cfg.validator_count));
        let mut delta = StateTransition::new(&base);
        delta.ensure_psi().good.insert([7u8; 32]);
        let verdict = unanimous_valid_verdict(&cfg, [7u8; 32]);
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![verdict],
            culprits: vec![],
            faults: vec![],
        };
        let err = process(&mut delta, &cfg, &extrinsic).unwrap_err();
        assert_eq!(err, DisputesError::SetConflict);
    }

    #[test]
    fn culprit_against_unknown_target_rejected() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let mut delta = StateTransition::new(&base);
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![],
            culprits: vec![Culprit {
                target: [1u8; 32],
                key: [0u8; 32],
                signature: [0u8; 64],
            }],
            faults: vec![],
        };
        let err = process(&mut delta, &cfg, &extrinsic).unwrap_err();
        assert_eq!(err, DisputesError::UnknownCulpritTarget);
    }
}
