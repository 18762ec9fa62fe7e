//! Core wire/domain types shared across every sub-step.

use crate::codec::{Codec, Reader, Writer};
use crate::error::CodecError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_big_array::BigArray;

/// 32-byte opaque hash.
pub type Hash = [u8; 32];

/// 32-byte state-merklization key.
pub type StateKey = [u8; 32];

/// Block slot number.
pub type TimeSlot = u32;

/// Service account identifier.
pub type ServiceId = u32;

/// Index into the current validator set.
pub type ValidatorIndex = u16;

/// Index into the fixed core set.
pub type CoreIndex = u16;

/// Gas units.
pub type Gas = u64;

pub const ZERO_HASH: Hash = [0u8; 32];

/// Ed25519 public key.
pub type Ed25519Key = [u8; 32];
/// Ed25519 signature.
pub type Ed25519Signature = [u8; 64];
/// Bandersnatch public key.
pub type BandersnatchKey = [u8; 32];
/// Bandersnatch (IETF) VRF signature.
pub type BandersnatchVrfSignature = [u8; 96];
/// Bandersnatch ring-VRF signature.
pub type BandersnatchRingSignature = [u8; 784];
/// Bandersnatch ring-VRF root commitment.
pub type BandersnatchVrfRoot = [u8; 144];
/// BLS public key (reserved for future validator metadata; unused by the
/// STF itself but part of the validator record's declared shape).
pub type BlsKey = [u8; 144];

/// A validator's full key bundle, as carried in ι/κ/λ/γ_k.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidatorKeys {
    pub bandersnatch: BandersnatchKey,
    pub ed25519: Ed25519Key,
    #[cfg_attr(feature = "serde", serde(with = "BigArray"))]
    pub bls: BlsKey,
    /// Arbitrary network address metadata, opaque to the STF.
    #[cfg_attr(feature = "serde", serde(with = "BigArray"))]
    pub metadata: [u8; 128],
}

impl Default for ValidatorKeys {
    fn default() -> Self {
        Self {
            bandersnatch: [0u8; 32],
            ed25519: [0u8; 32],
            bls: [0u8; 144],
            metadata: [0u8; 128],
        }
    }
}

/// A ring-VRF ticket submitted for the epoch's sealing competition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ticket {
    pub id: Hash,
    pub attempt: u8,
}

/// A ticket envelope as it arrives on the wire, before verification.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TicketEnvelope {
    pub attempt: u8,
    #[cfg_attr(feature = "serde", serde(with = "BigArray"))]
    pub signature: BandersnatchRingSignature,
}

/// γ_s: the slot-sealer series, either a run of tickets or a run of
/// fallback keys. Both arms are always exactly `E` long.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SealerSeries {
    Tickets(Vec<Ticket>),
    Fallback(Vec<BandersnatchKey>),
}

impl SealerSeries {
    pub fn len(&self) -> usize {
        match self {
            SealerSeries::Tickets(t) => t.len(),
            SealerSeries::Fallback(k) => k.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_tickets(&self) -> bool {
        matches!(self, SealerSeries::Tickets(_))
    }
}

impl Codec for ValidatorKeys {
    fn encode(&self, w: &mut Writer) {
        self.bandersnatch.encode(w);
        self.ed25519.encode(w);
        self.bls.encode(w);
        self.metadata.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            bandersnatch: Codec::decode(r)?,
            ed25519: Codec::decode(r)?,
            bls: Codec::decode(r)?,
            metadata: Codec::decode(r)?,
        })
    }
}

impl Codec for SealerSeries {
    fn encode(&self, w: &mut Writer) {
        match self {
            SealerSeries::Tickets(tickets) => {
                w.byte(0);
                tickets.encode(w);
            }
            SealerSeries::Fallback(keys) => {
                w.byte(1);
                keys.encode(w);
            }
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        match r.byte()? {
            0 => Ok(SealerSeries::Tickets(Codec::decode(r)?)),
            1 => Ok(SealerSeries::Fallback(Codec::decode(r)?)),
            _ => Err(CodecError::InvalidEncoding),
        }
    }
}
