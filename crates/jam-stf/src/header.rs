//! Header validator: structural, timing, author, marker, seal, and
//! entropy-source checks (§4.5).

use crate::block::Header;
use crate::crypto::verify_bandersnatch_vrf;
use crate::delta::StateTransition;
use crate::error::HeaderError;
use crate::merkle::m_sigma;
use crate::safrole::SafroleOutcome;
use crate::types::SealerSeries;

const TICKET_SEAL_CONTEXT: &[u8] = b"jam_ticket_seal";
const FALLBACK_SEAL_CONTEXT: &[u8] = b"jam_fallback_seal";
const ENTROPY_CONTEXT: &[u8] = b"jam_entropy";

/// Checks independent of Safrole's own outcome: parent linkage, prior
/// state root, extrinsic hash, slot monotonicity, and author range.
pub fn check_structural(
    header: &Header,
    delta: &StateTransition,
    extrinsic_bytes: &[u8],
    pre_state_entries: &[([u8; 32], Vec<u8>)],
) -> Result<(), HeaderError> {
    let beta = delta.get_beta();
    if header.parent != beta.latest_hash() {
        return Err(HeaderError::InvalidParentHash);
    }
    if header.parent_state_root != m_sigma(pre_state_entries) {
        return Err(HeaderError::InvalidPriorStateRoot);
    }
    if header.extrinsic_hash != crate::merkle::blake2b_256(extrinsic_bytes) {
        return Err(HeaderError::InvalidExtrinsicHash);
    }
    if header.slot <= *delta.get_tau() {
        return Err(HeaderError::SlotNotGreaterThanParent);
    }
    if header.author_index as usize >= delta.get_kappa().len() {
        return Err(HeaderError::InvalidAuthorIndex);
    }
    Ok(())
}

/// Marker-presence checks against Safrole's own computed outcome (§4.5
/// "Markers").
pub fn check_markers(header: &Header, outcome: &SafroleOutcome) -> Result<(), HeaderError> {
    if header.epoch_mark.is_some() != outcome.epoch_marker {
        return Err(HeaderError::InvalidEpochMarkerTiming);
    }
    match (&header.tickets_mark, &outcome.tickets_marker) {
        (None, None) => {}
        (Some(got), Some(want)) if got == want => {}
        _ => return Err(HeaderError::InvalidTicketsMarkerTiming),
    }
    Ok(())
}

/// Seal and entropy-source verification (§4.5 "Seal", "Entropy source").
pub fn check_seal_and_entropy(
    header: &Header,
    delta: &StateTransition,
    is_new_epoch: bool,
) -> Result<(), HeaderError> {
    let eta = *delta.get_eta();
    let entropy = if is_new_epoch { eta[2] } else { eta[3] };

    let author = delta
        .get_kappa()
        .get(header.author_index as usize)
        .ok_or(HeaderError::InvalidAuthorIndex)?;

    let gamma_s = delta.get_gamma_s();
    let epoch_length = gamma_s.len() as u32;
    let epoch_slot = header.slot % epoch_length.max(1);

    let tickets_mode = gamma_s.is_tickets();

    let unsigned = header.unsigned_bytes();

    let seal_output = if tickets_mode {
        let ticket = match gamma_s {
            SealerSeries::Tickets(tickets) => tickets
                .get(epoch_slot as usize)
                .ok_or(HeaderError::TicketSealVerificationFailed)?,
            SealerSeries::Fallback(_) => unreachable!("tickets_mode implies Tickets variant"),
        };
        let mut input = Vec::with_capacity(TICKET_SEAL_CONTEXT.len() + 32 + 1);
        input.extend_from_slice(TICKET_SEAL_CONTEXT);
        input.extend_from_slice(&entropy);
        input.push(ticket.attempt);
        let output = verify_bandersnatch_vrf(&author.bandersnatch, &input, &unsigned, &header.seal)
            .map_err(|_| HeaderError::TicketSealVerificationFailed)?;
        if output != ticket.id {
            return Err(HeaderError::InvalidTicketId);
        }
        output
    } else {
        let mut input = Vec::with_capacity(FALLBACK_SEAL_CONTEXT.len() + 32);
        input.extend_from_slice(FALLBACK_SEAL_CONTEXT);
        input.extend_from_slice(&entropy);
        verify_bandersnatch_vrf(&author.bandersnatch, &input, &unsigned, &header.seal)
            .map_err(|_| HeaderError::FallbackSealVerificationFailed)?
    };

    let mut entropy_input = Vec::with_capacity(ENTROPY_CONTEXT.len() + 32);
    entropy_input.extend_from_slice(ENTROPY_CONTEXT);
    entropy_input.extend_from_slice(&seal_output);
    verify_bandersnatch_vrf(&author.bandersnatch, &entropy_input, &[], &header.entropy_source)
        .map_err(|_| HeaderError::EntropySourceVerificationFailed)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::State;
    use crate::types::ValidatorKeys;

    #[test]
    fn rejects_wrong_parent() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let delta = StateTransition::new(&base);
        let header = Header {
            parent: [9u8; 32],
            parent_state_root: [0u8; 32],
            extrinsic_hash: crate::merkle::blake2b_256(&[]),
            slot: 1,
            epoch_mark: None,
            tickets_mark: None,
            author_index: 0,
            entropy_source: [0u8; 96],
            seal: [0u8; 96],
        };
        let err = check_structural(&header, &delta, &[], &[]).unwrap_err();
        assert_eq!(err, HeaderError::InvalidParentHash);
    }

    #[test]
    fn rejects_out_of_range_author() {
        let cfg = Config::tiny();
        let base = State::genesis(&cfg, vec![ValidatorKeys::default(); 6]);
        let delta = StateTransition::new(&base);
        let header = Header {
            parent: base.beta.latest_hash(),
            parent_state_root: m_sigma(&[]),
            extrinsic_hash: crate::merkle::blake2b_256(&[]),
            slot: 1,
            epoch_mark: None,
            tickets_mark: None,
            author_index: 200,
            entropy_source: [0u8; 96],
            seal: [0u8; 96],
        };
        let err = check_structural(&header, &delta, &[], &[]).unwrap_err();
        assert_eq!(err, HeaderError::InvalidAuthorIndex);
    }

    #[test]
    fn marker_mismatch_rejected() {
        let header = Header {
            parent: [0u8; 32],
            parent_state_root: [0u8; 32],
            extrinsic_hash: [0u8; 32],
            slot: 1,
            epoch_mark: None,
            tickets_mark: None,
            author_index: 0,
            entropy_source: [0u8; 96],
            seal: [0u8; 96],
        };
        let outcome = SafroleOutcome {
            epoch_marker: true,
            tickets_marker: None,
        };
        let err = check_markers(&header, &outcome).unwrap_err();
        assert_eq!(err, HeaderError::InvalidEpochMarkerTiming);
    }
}
