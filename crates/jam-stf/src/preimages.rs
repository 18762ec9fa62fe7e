//! Preimages extrinsic processing (§4.14 [ADDED]): a service that has
//! solicited a preimage hash can have it supplied in-band, moving it from
//! `solicited_preimages` into `available_preimages` stamped with the slot
//! at which it became available.

use crate::delta::StateTransition;
use crate::error::PreimagesError;
use crate::merkle::blake2b_256;
use crate::block::PreimageEntry;
use crate::types::TimeSlot;

pub fn process(delta: &mut StateTransition, slot: TimeSlot, preimages: &[PreimageEntry]) -> Result<(), PreimagesError> {
    for entry in preimages {
        let hash = blake2b_256(&entry.data);
        let services = delta.ensure_delta();
        let account = services.get_mut(&entry.service_id).ok_or(PreimagesError::BadServiceId)?;

        if !account.solicited_preimages.contains(&hash) {
            return Err(PreimagesError::PreimageUnneeded);
        }
        if account.available_preimages.contains_key(&hash) {
            return Err(PreimagesError::PreimageAlreadyProvided);
        }

        account.solicited_preimages.remove(&hash);
        account.available_preimages.insert(hash, slot);
    }
    Ok(())
}
