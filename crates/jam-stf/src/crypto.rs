//! Crypto oracles (§4.2, §9): `verify_ed25519`, `verify_bandersnatch_vrf`,
//! `verify_ring_vrf`, plus the Blake2b-256/Keccak-256 hash functions
//! re-exported from `merkle.rs`. Every oracle here is pure and
//! deterministic — no key material is generated or stored by this crate,
//! only verified, matching §1's framing of signature primitives as
//! "typed verification oracles" external to the STF's own logic.
//!
//! Bandersnatch (ring-)VRF verification is grounded on the `ark-vrf`
//! bandersnatch suite, the same crate the sibling `bandersnatch-ffi`
//! bridge in the corpus wraps for the identical purpose (ticket-id
//! derivation and ring-signature verification against a ring root).

pub use crate::merkle::{blake2b_256, keccak_256};
use crate::types::{
    BandersnatchKey, BandersnatchRingSignature, BandersnatchVrfRoot, BandersnatchVrfSignature,
    Ed25519Key, Ed25519Signature, Hash,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_vrf::ring::Verifier as RingVerifierTrait;
use ark_vrf::suites::bandersnatch::{
    AffinePoint, BandersnatchSha512Ell2 as Suite, Input, Output, Public, RingCommitment, RingProof,
    RingProofParams,
};
use ark_vrf::Suite as _;
use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use thiserror::Error;

/// Seed for the ring-proof parameters this crate derives its ring
/// commitments from. Not a real trusted-setup ceremony output — the same
/// role the teacher's own `RingContext::new_testing()` plays for its
/// ring-VRF harness, and not something a production deployment should
/// keep using as its SRS.
const RING_SRS_SEED: [u8; 32] = *b"jam-stf-ring-vrf-test-srs-seed--";

fn ring_proof_params(ring_size: usize) -> RingProofParams {
    RingProofParams::from_seed(ring_size, RING_SRS_SEED)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("malformed public key")]
    MalformedKey,
    #[error("malformed signature or proof")]
    MalformedSignature,
    #[error("signature or proof failed to verify")]
    VerificationFailed,
}

/// Verify a plain Ed25519 signature over `message`.
pub fn verify_ed25519(
    key: &Ed25519Key,
    message: &[u8],
    signature: &Ed25519Signature,
) -> Result<(), CryptoError> {
    let vk = VerifyingKey::from_bytes(key).map_err(|_| CryptoError::MalformedKey)?;
    let sig = DalekSignature::from_bytes(signature);
    vk.verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Verify a single-key (IETF) Bandersnatch VRF signature, used for the
/// header's entropy-source proof (§4.5). Returns the VRF output hash.
pub fn verify_bandersnatch_vrf(
    key: &BandersnatchKey,
    input: &[u8],
    aux: &[u8],
    signature: &BandersnatchVrfSignature,
) -> Result<Hash, CryptoError> {
    let public = Public::deserialize_compressed(&key[..])
        .map_err(|_| CryptoError::MalformedKey)?;
    let vrf_input =
        <Suite as ark_vrf::Suite>::data_to_point(input).ok_or(CryptoError::MalformedSignature)?;
    let vrf_input = Input::from(vrf_input);

    // The IETF proof is the first 32 bytes (output point) followed by a
    // 64-byte Schnorr-like proof, matching the 96-byte fixed signature
    // size declared in §3.
    let output_point = AffinePoint::deserialize_compressed(&signature[0..32])
        .map_err(|_| CryptoError::MalformedSignature)?;
    let output = Output::from(output_point);
    let proof = ark_vrf::ietf::Proof::<Suite>::deserialize_compressed(&signature[32..96])
        .map_err(|_| CryptoError::MalformedSignature)?;

    ark_vrf::ietf::Verifier::verify(&public, vrf_input, output, aux, &proof)
        .map_err(|_| CryptoError::VerificationFailed)?;

    Ok(vrf_output_hash(&output))
}

/// Verify a ring-VRF signature against a ring root commitment (§4.4 step
/// 4, §4.5's seal verification). Returns the VRF output hash used to
/// derive a ticket id or compare against an expected seal output.
pub fn verify_ring_vrf(
    ring_root: &BandersnatchVrfRoot,
    ring_size: usize,
    input: &[u8],
    aux: &[u8],
    signature: &BandersnatchRingSignature,
) -> Result<Hash, CryptoError> {
    let commitment = RingCommitment::deserialize_compressed(&ring_root[..])
        .map_err(|_| CryptoError::MalformedKey)?;

    let vrf_input =
        <Suite as ark_vrf::Suite>::data_to_point(input).ok_or(CryptoError::MalformedSignature)?;
    let vrf_input = Input::from(vrf_input);

    let output_point = AffinePoint::deserialize_compressed(&signature[0..32])
        .map_err(|_| CryptoError::MalformedSignature)?;
    let output = Output::from(output_point);

    let proof = RingProof::deserialize_compressed(&signature[32..784])
        .map_err(|_| CryptoError::MalformedSignature)?;

    let verifier = ark_vrf::suites::bandersnatch::RingVerifier::new(commitment, ring_size);
    verifier
        .verify_ring_proof(vrf_input, output, aux, &proof)
        .map_err(|_| CryptoError::VerificationFailed)?;

    Ok(vrf_output_hash(&output))
}

/// Build the ring-root commitment over a validator set's Bandersnatch keys
/// (§4.4 step 6.c) — the producer side of what `verify_ring_vrf` consumes.
/// Unresolvable keys (wrong length, zeroed/offender slots) fall back to the
/// ring proof's padding point rather than failing the whole commitment.
pub fn bandersnatch_ring_commitment(keys: &[BandersnatchKey]) -> Result<BandersnatchVrfRoot, CryptoError> {
    let points: Vec<AffinePoint> = keys
        .iter()
        .map(|key| {
            AffinePoint::deserialize_compressed(&key[..])
                .unwrap_or_else(|_| RingProofParams::padding_point())
        })
        .collect();

    let params = ring_proof_params(points.len());
    let verifier_key = params.verifier_key(&points);
    let commitment = verifier_key.commitment();

    let mut bytes = Vec::new();
    commitment
        .serialize_compressed(&mut bytes)
        .map_err(|_| CryptoError::MalformedKey)?;

    let mut root = [0u8; 144];
    if bytes.len() > root.len() {
        return Err(CryptoError::MalformedKey);
    }
    root[..bytes.len()].copy_from_slice(&bytes);
    Ok(root)
}

fn vrf_output_hash(output: &Output) -> Hash {
    let mut bytes = Vec::new();
    output
        .hash()
        .serialize_compressed(&mut bytes)
        .expect("in-memory serialization cannot fail");
    blake2b_256(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A ring commitment built over all-zero key slots (an empty/offender-
    /// heavy validator set, the genesis case) must still round-trip through
    /// the exact deserialization `verify_ring_vrf` performs on γ_z — a
    /// digest stood in for a commitment here would fail this parse.
    #[test]
    fn ring_commitment_deserializes_as_a_valid_ring_commitment() {
        let keys = vec![[0u8; 32]; 6];
        let root = bandersnatch_ring_commitment(&keys).unwrap();
        RingCommitment::deserialize_compressed(&root[..]).unwrap();
    }

    /// `verify_ring_vrf` must get past commitment parsing (a real
    /// `bandersnatch_ring_commitment` output) and fail on the garbage
    /// proof bytes instead — confirming the failure mode is "bad proof",
    /// not "bad commitment".
    #[test]
    fn verify_ring_vrf_parses_a_real_commitment_before_rejecting_a_bad_proof() {
        let keys = vec![[0u8; 32]; 6];
        let root = bandersnatch_ring_commitment(&keys).unwrap();
        let garbage_signature = [0u8; 784];
        let err = verify_ring_vrf(&root, keys.len(), b"input", &[], &garbage_signature).unwrap_err();
        assert_eq!(err, CryptoError::MalformedSignature);
    }
}
