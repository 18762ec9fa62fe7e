//! Per-core authorization pool/queue rotation (§4.10).

use crate::config::Config;
use crate::delta::StateTransition;
use crate::error::AuthorizationsError;
use crate::types::{Hash, TimeSlot};

/// `reported`: `(core, auth_hash)` pairs consumed by this block's
/// guarantees — each is removed from its core's pool before rotation.
pub fn process(
    delta: &mut StateTransition,
    cfg: &Config,
    current_slot: TimeSlot,
    reported: &[(u16, Hash)],
) -> Result<(), AuthorizationsError> {
    let core_count = delta.base().core_count();
    for &(core, hash) in reported {
        if core as usize >= core_count {
            return Err(AuthorizationsError::BadCoreIndex);
        }
        let pool = &mut delta.ensure_authorizations().pool[core as usize];
        pool.retain(|h| *h != hash);
    }

    let queue_len = delta.get_authorizations().queue[0].len().max(1);
    let slot_index = (current_slot as usize) % queue_len;
    for core in 0..core_count {
        let auth = delta.get_authorizations().queue[core][slot_index];
        let pool = &mut delta.ensure_authorizations().pool[core];
        pool.push(auth);
        while pool.len() > cfg.max_auth_pool_items {
            pool.remove(0);
        }
    }

    Ok(())
}
