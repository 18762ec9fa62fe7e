//! Safrole: epoch rotation, entropy accumulation, and the ticket-based
//! slot-sealer series (§4.4).

use crate::config::Config;
use crate::crypto::verify_ring_vrf;
use crate::delta::StateTransition;
use crate::error::SafroleError;
use crate::merkle::blake2b_256;
use crate::types::{BandersnatchKey, Hash, SealerSeries, Ticket, TicketEnvelope};

/// Markers the header validator must find present/absent per §4.5.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SafroleOutcome {
    pub epoch_marker: bool,
    pub tickets_marker: Option<Vec<Ticket>>,
}

const TICKET_SEAL_CONTEXT: &[u8] = b"jam_ticket_seal";

/// Interleave from both ends: `output[2k] = input[k]`, `output[2k+1] =
/// input[n-1-k]`.
pub fn outside_in_order<T: Clone>(input: &[T]) -> Vec<T> {
    let n = input.len();
    let mut out = Vec::with_capacity(n);
    let mut lo = 0usize;
    let mut hi = n;
    while lo < hi {
        out.push(input[lo].clone());
        lo += 1;
        if lo < hi {
            hi -= 1;
            out.push(input[hi].clone());
        }
    }
    out
}

/// Deterministic fallback-mode key derivation: index into κ by hashing η₂
/// with the slot-in-epoch index.
fn fallback_keys(eta2: &Hash, validators: &[crate::types::ValidatorKeys], epoch_length: u32) -> Vec<BandersnatchKey> {
    (0..epoch_length)
        .map(|i| {
            let mut buf = Vec::with_capacity(36);
            buf.extend_from_slice(eta2);
            buf.extend_from_slice(&i.to_le_bytes());
            let h = blake2b_256(&buf);
            let idx = (u32::from_le_bytes([h[0], h[1], h[2], h[3]]) as usize) % validators.len().max(1);
            validators[idx].bandersnatch
        })
        .collect()
}

/// Run the Safrole algorithm (§4.4 steps 1-9) against the current
/// transition, mutating τ-adjacent components as needed. `tau_unchanged`
/// is the pre-state slot (the caller advances τ itself as part of the
/// driver's time-transition step).
pub fn process(
    delta: &mut StateTransition,
    cfg: &Config,
    slot: crate::types::TimeSlot,
    entropy_contribution: Hash,
    tickets: &[TicketEnvelope],
) -> Result<SafroleOutcome, SafroleError> {
    let tau = *delta.get_tau();

    // 1.
    if slot <= tau {
        return Err(SafroleError::BadSlot);
    }

    // 2.
    if tickets.len() > cfg.max_tickets_per_extrinsic as usize {
        return Err(SafroleError::TooManyTicketsInExtrinsic);
    }
    for envelope in tickets {
        if envelope.attempt >= cfg.max_ticket_attempts {
            return Err(SafroleError::BadTicketAttempt);
        }
    }

    let epoch_slot = slot % cfg.epoch_length;

    // 3.
    if epoch_slot >= cfg.ticket_submission_end && !tickets.is_empty() {
        return Err(SafroleError::UnexpectedTicket);
    }

    // 4. Verify ring-VRF proofs and derive ticket ids.
    let gamma_z = *delta.get_gamma_z();
    let eta = *delta.get_eta();
    let validator_count = cfg.validator_count as usize;
    let mut verified: Vec<Ticket> = Vec::with_capacity(tickets.len());
    for envelope in tickets {
        let mut input = Vec::with_capacity(TICKET_SEAL_CONTEXT.len() + 32 + 1);
        input.extend_from_slice(TICKET_SEAL_CONTEXT);
        input.extend_from_slice(&eta[2]);
        input.push(envelope.attempt);
        let id = verify_ring_vrf(&gamma_z, validator_count, &input, &[], &envelope.signature)
            .map_err(|_| SafroleError::BadTicketProof)?;
        verified.push(Ticket {
            id,
            attempt: envelope.attempt,
        });
    }

    // 5. Strictly increasing by id, no collision with γ_a.
    for pair in verified.windows(2) {
        if pair[0].id >= pair[1].id {
            return Err(SafroleError::BadTicketOrder);
        }
    }
    let existing_ids: std::collections::HashSet<Hash> =
        delta.get_gamma_a().iter().map(|t| t.id).collect();
    for t in &verified {
        if existing_ids.contains(&t.id) {
            return Err(SafroleError::DuplicateTicket);
        }
    }

    let time = crate::time::Time::new(tau, slot);
    let is_new_epoch = time.is_new_epoch(cfg);
    let mut outcome = SafroleOutcome::default();

    if is_new_epoch {
        outcome.epoch_marker = true;

        // 6.a shift entropy.
        let e = *delta.ensure_eta();
        *delta.ensure_eta() = [e[0], e[0], e[1], e[2]];

        // 6.b rotate validators, zeroing offenders by ed25519 membership.
        let punished = delta.get_psi().punish.clone();
        let ian = delta.get_iota().clone();
        let gk = delta.get_gamma_k().clone();
        let k = delta.get_kappa().clone();
        *delta.ensure_lambda() = k;
        *delta.ensure_kappa() = gk;
        let zeroed: Vec<_> = ian
            .into_iter()
            .map(|v| {
                if punished.contains(&v.ed25519) {
                    crate::types::ValidatorKeys::default()
                } else {
                    v
                }
            })
            .collect();
        *delta.ensure_gamma_k() = zeroed;

        // 6.c ring root over γ_k's Bandersnatch keys.
        let gk_keys: Vec<BandersnatchKey> = delta.get_gamma_k().iter().map(|v| v.bandersnatch).collect();
        *delta.ensure_gamma_z() =
            crate::crypto::bandersnatch_ring_commitment(&gk_keys).map_err(|_| SafroleError::BadRingCommitment)?;

        // 6.d slot-sealer series.
        let prior_was_in_tail = time.prior_was_in_ticket_submission_tail(cfg);
        let is_consecutive = time.is_consecutive_epoch(cfg);
        let gamma_a_full = delta.get_gamma_a().len() == cfg.epoch_length as usize;
        if prior_was_in_tail && is_consecutive && gamma_a_full {
            let ordered = outside_in_order(delta.get_gamma_a());
            *delta.ensure_gamma_s() = SealerSeries::Tickets(ordered);
        } else {
            let eta2_now = delta.get_eta()[2];
            let kappa = delta.get_kappa().clone();
            let keys = fallback_keys(&eta2_now, &kappa, cfg.epoch_length);
            *delta.ensure_gamma_s() = SealerSeries::Fallback(keys);
        }

        // 6.e
        *delta.ensure_gamma_a() = Vec::new();
    }

    // 7. η₀ ← H(η₀ ‖ Y(H_v)).
    {
        let e = *delta.ensure_eta();
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&e[0]);
        buf.extend_from_slice(&entropy_contribution);
        let new_eta0 = blake2b_256(&buf);
        *delta.ensure_eta() = [new_eta0, e[1], e[2], e[3]];
    }

    // 8. Merge tickets into γ_a, id-sorted, truncated at E.
    if epoch_slot < cfg.ticket_submission_end && !verified.is_empty() {
        let mut ga = delta.ensure_gamma_a().clone();
        ga.extend(verified);
        ga.sort_by(|a, b| a.id.cmp(&b.id));
        ga.truncate(cfg.epoch_length as usize);
        *delta.ensure_gamma_a() = ga;
    }

    // 9. Tickets marker: same epoch, crossed Y, γ_a reached exactly E.
    if !is_new_epoch {
        let crossed = time.did_cross_ticket_submission_end(cfg);
        if crossed && delta.get_gamma_a().len() == cfg.epoch_length as usize {
            outcome.tickets_marker = Some(outside_in_order(delta.get_gamma_a()));
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_in_order_interleaves_from_both_ends() {
        let input = vec![0, 1, 2, 3, 4, 5];
        assert_eq!(outside_in_order(&input), vec![0, 5, 1, 4, 2, 3]);
    }

    #[test]
    fn outside_in_order_handles_odd_length() {
        let input = vec![0, 1, 2, 3, 4];
        assert_eq!(outside_in_order(&input), vec![0, 4, 1, 3, 2]);
    }

    #[test]
    fn bad_slot_rejected() {
        let cfg = Config::tiny();
        let base = crate::state::State::genesis(&cfg, vec![Default::default(); 6]);
        let mut delta = StateTransition::new(&base);
        let err = process(&mut delta, &cfg, 0, [0u8; 32], &[]).unwrap_err();
        assert_eq!(err, SafroleError::BadSlot);
    }

    #[test]
    fn too_many_tickets_rejected() {
        let cfg = Config::tiny();
        let base = crate::state::State::genesis(&cfg, vec![Default::default(); 6]);
        let mut delta = StateTransition::new(&base);
        let envelopes = vec![
            TicketEnvelope {
                attempt: 0,
                signature: [0u8; 784],
            };
            (cfg.max_tickets_per_extrinsic + 1) as usize
        ];
        let err = process(&mut delta, &cfg, 1, [0u8; 32], &envelopes).unwrap_err();
        assert_eq!(err, SafroleError::TooManyTicketsInExtrinsic);
    }

    #[test]
    fn bad_ticket_attempt_rejected() {
        let cfg = Config::tiny();
        let base = crate::state::State::genesis(&cfg, vec![Default::default(); 6]);
        let mut delta = StateTransition::new(&base);
        let envelopes = vec![TicketEnvelope {
            attempt: cfg.max_ticket_attempts,
            signature: [0u8; 784],
        }];
        let err = process(&mut delta, &cfg, 1, [0u8; 32], &envelopes).unwrap_err();
        assert_eq!(err, SafroleError::BadTicketAttempt);
    }

    #[test]
    fn unexpected_ticket_after_submission_end() {
        let cfg = Config::tiny();
        let base = crate::state::State::genesis(&cfg, vec![Default::default(); 6]);
        let mut delta = StateTransition::new(&base);
        *delta.ensure_tau() = 3;
        let envelopes = vec![TicketEnvelope {
            attempt: 0,
            signature: [0u8; 784],
        }];
        // epoch_slot for slot 11 is 11, >= Y=10.
        let err = process(&mut delta, &cfg, 11, [0u8; 32], &envelopes).unwrap_err();
        assert_eq!(err, SafroleError::UnexpectedTicket);
    }

    #[test]
    fn empty_block_advances_entropy_without_new_epoch() {
        let cfg = Config::tiny();
        let base = crate::state::State::genesis(&cfg, vec![Default::default(); 6]);
        let mut delta = StateTransition::new(&base);
        let outcome = process(&mut delta, &cfg, 1, [7u8; 32], &[]).unwrap();
        assert!(!outcome.epoch_marker);
        assert_ne!(*delta.get_eta(), base.eta);
    }
}
