//! Wire-format types: `Block = Header ‖ Extrinsic` (§6), plus their
//! [`Codec`] implementations. Every field is encoded in declaration order.

use crate::codec::{Codec, Reader, Writer};
use crate::error::CodecError;
use crate::state::report::{Assurance, Guarantee, GuarantorSignature, WorkOutput, WorkReport, WorkResult};
use crate::types::{
    BandersnatchKey, BandersnatchVrfSignature, Ed25519Key, Ed25519Signature, Hash, ServiceId, Ticket,
    TicketEnvelope, TimeSlot, ValidatorIndex,
};

/// Present only on the first block of an epoch (§4.5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochMarker {
    pub entropy: Hash,
    pub tickets_entropy: Hash,
    pub validators: Vec<BandersnatchKey>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub parent: Hash,
    pub parent_state_root: Hash,
    pub extrinsic_hash: Hash,
    pub slot: TimeSlot,
    pub epoch_mark: Option<EpochMarker>,
    pub tickets_mark: Option<Vec<Ticket>>,
    pub author_index: ValidatorIndex,
    pub entropy_source: BandersnatchVrfSignature,
    pub seal: BandersnatchVrfSignature,
}

impl Header {
    /// The unsigned header: every field except `seal` (§4.5's "serialized
    /// unsigned-header" signed by the sealer).
    pub fn encode_unsigned(&self, w: &mut Writer) {
        self.parent.encode(w);
        self.parent_state_root.encode(w);
        self.extrinsic_hash.encode(w);
        self.slot.encode(w);
        self.epoch_mark.encode(w);
        self.tickets_mark.encode(w);
        self.author_index.encode(w);
        self.entropy_source.encode(w);
    }

    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode_unsigned(&mut w);
        w.into_vec()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisputesExtrinsic {
    pub verdicts: Vec<Verdict>,
    pub culprits: Vec<Culprit>,
    pub faults: Vec<Fault>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteSignature {
    pub validator_index: ValidatorIndex,
    pub vote: bool,
    pub signature: Ed25519Signature,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub target: Hash,
    pub age: u32,
    pub votes: Vec<VoteSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Culprit {
    pub target: Hash,
    pub key: Ed25519Key,
    pub signature: Ed25519Signature,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub target: Hash,
    pub vote: bool,
    pub key: Ed25519Key,
    pub signature: Ed25519Signature,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreimageEntry {
    pub service_id: ServiceId,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extrinsic {
    pub tickets: Vec<TicketEnvelope>,
    pub disputes: DisputesExtrinsic,
    pub preimages: Vec<PreimageEntry>,
    pub assurances: Vec<Assurance>,
    pub guarantees: Vec<Guarantee>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: Header,
    pub extrinsic: Extrinsic,
}

impl Codec for EpochMarker {
    fn encode(&self, w: &mut Writer) {
        self.entropy.encode(w);
        self.tickets_entropy.encode(w);
        self.validators.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entropy: Codec::decode(r)?,
            tickets_entropy: Codec::decode(r)?,
            validators: Codec::decode(r)?,
        })
    }
}

impl Codec for Ticket {
    fn encode(&self, w: &mut Writer) {
        self.id.encode(w);
        self.attempt.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            id: Codec::decode(r)?,
            attempt: Codec::decode(r)?,
        })
    }
}

impl Codec for TicketEnvelope {
    fn encode(&self, w: &mut Writer) {
        self.attempt.encode(w);
        self.signature.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            attempt: Codec::decode(r)?,
            signature: Codec::decode(r)?,
        })
    }
}

impl Codec for Header {
    fn encode(&self, w: &mut Writer) {
        self.encode_unsigned(w);
        self.seal.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            parent: Codec::decode(r)?,
            parent_state_root: Codec::decode(r)?,
            extrinsic_hash: Codec::decode(r)?,
            slot: Codec::decode(r)?,
            epoch_mark: Codec::decode(r)?,
            tickets_mark: Codec::decode(r)?,
            author_index: Codec::decode(r)?,
            entropy_source: Codec::decode(r)?,
            seal: Codec::decode(r)?,
        })
    }
}

impl Codec for VoteSignature {
    fn encode(&self, w: &mut Writer) {
        self.validator_index.encode(w);
        self.vote.encode(w);
        self.signature.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            validator_index: Codec::decode(r)?,
            vote: Codec::decode(r)?,
            signature: Codec::decode(r)?,
        })
    }
}

impl Codec for Verdict {
    fn encode(&self, w: &mut Writer) {
        self.target.encode(w);
        self.age.encode(w);
        self.votes.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            target: Codec::decode(r)?,
            age: Codec::decode(r)?,
            votes: Codec::decode(r)?,
        })
    }
}

impl Codec for Culprit {
    fn encode(&self, w: &mut Writer) {
        self.target.encode(w);
        self.key.encode(w);
        self.signature.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            target: Codec::decode(r)?,
            key: Codec::decode(r)?,
            signature: Codec::decode(r)?,
        })
    }
}

impl Codec for Fault {
    fn encode(&self, w: &mut Writer) {
        self.target.encode(w);
        self.vote.encode(w);
        self.key.encode(w);
        self.signature.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            target: Codec::decode(r)?,
            vote: Codec::decode(r)?,
            key: Codec::decode(r)?,
            signature: Codec::decode(r)?,
        })
    }
}

impl Codec for DisputesExtrinsic {
    fn encode(&self, w: &mut Writer) {
        self.verdicts.encode(w);
        self.culprits.encode(w);
        self.faults.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            verdicts: Codec::decode(r)?,
            culprits: Codec::decode(r)?,
            faults: Codec::decode(r)?,
        })
    }
}

impl Codec for PreimageEntry {
    fn encode(&self, w: &mut Writer) {
        self.service_id.encode(w);
        self.data.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            service_id: Codec::decode(r)?,
            data: Codec::decode(r)?,
        })
    }
}

impl Codec for WorkOutput {
    fn encode(&self, w: &mut Writer) {
        match self {
            WorkOutput::Success { gas_used, output_hash } => {
                w.byte(0);
                gas_used.encode(w);
                output_hash.encode(w);
            }
            WorkOutput::Failure { gas_used } => {
                w.byte(1);
                gas_used.encode(w);
            }
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        match r.byte()? {
            0 => Ok(WorkOutput::Success {
                gas_used: Codec::decode(r)?,
                output_hash: Codec::decode(r)?,
            }),
            1 => Ok(WorkOutput::Failure {
                gas_used: Codec::decode(r)?,
            }),
            _ => Err(CodecError::InvalidEncoding),
        }
    }
}

impl Codec for WorkResult {
    fn encode(&self, w: &mut Writer) {
        self.service_id.encode(w);
        self.code_hash.encode(w);
        self.payload_hash.encode(w);
        self.accumulate_gas.encode(w);
        self.output.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            service_id: Codec::decode(r)?,
            code_hash: Codec::decode(r)?,
            payload_hash: Codec::decode(r)?,
            accumulate_gas: Codec::decode(r)?,
            output: Codec::decode(r)?,
        })
    }
}

impl Codec for WorkReport {
    fn encode(&self, w: &mut Writer) {
        self.package_hash.encode(w);
        self.core_index.encode(w);
        self.authorizer_hash.encode(w);
        self.auth_output.encode(w);
        self.anchor.encode(w);
        self.anchor_state_root.encode(w);
        self.anchor_beefy_root.encode(w);
        self.slot.encode(w);
        self.prerequisites.encode(w);
        self.segment_root_lookup.encode(w);
        self.results.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            package_hash: Codec::decode(r)?,
            core_index: Codec::decode(r)?,
            authorizer_hash: Codec::decode(r)?,
            auth_output: Codec::decode(r)?,
            anchor: Codec::decode(r)?,
            anchor_state_root: Codec::decode(r)?,
            anchor_beefy_root: Codec::decode(r)?,
            slot: Codec::decode(r)?,
            prerequisites: Codec::decode(r)?,
            segment_root_lookup: Codec::decode(r)?,
            results: Codec::decode(r)?,
        })
    }
}

impl Codec for GuarantorSignature {
    fn encode(&self, w: &mut Writer) {
        self.validator_index.encode(w);
        self.signature.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            validator_index: Codec::decode(r)?,
            signature: Codec::decode(r)?,
        })
    }
}

impl Codec for Guarantee {
    fn encode(&self, w: &mut Writer) {
        self.report.encode(w);
        self.signatures.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            report: Codec::decode(r)?,
            signatures: Codec::decode(r)?,
        })
    }
}

impl Codec for Assurance {
    fn encode(&self, w: &mut Writer) {
        self.validator_index.encode(w);
        self.anchor.encode(w);
        self.bitfield.encode(w);
        self.signature.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            validator_index: Codec::decode(r)?,
            anchor: Codec::decode(r)?,
            bitfield: Codec::decode(r)?,
            signature: Codec::decode(r)?,
        })
    }
}

impl Codec for Extrinsic {
    fn encode(&self, w: &mut Writer) {
        self.tickets.encode(w);
        self.disputes.encode(w);
        self.preimages.encode(w);
        self.assurances.encode(w);
        self.guarantees.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            tickets: Codec::decode(r)?,
            disputes: Codec::decode(r)?,
            preimages: Codec::decode(r)?,
            assurances: Codec::decode(r)?,
            guarantees: Codec::decode(r)?,
        })
    }
}

impl Codec for Block {
    fn encode(&self, w: &mut Writer) {
        self.header.encode(w);
        self.extrinsic.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            header: Codec::decode(r)?,
            extrinsic: Codec::decode(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{deserialize, serialize};

    #[test]
    fn ticket_roundtrip() {
        let t = Ticket {
            id: [3u8; 32],
            attempt: 1,
        };
        assert_eq!(deserialize::<Ticket>(&serialize(&t)).unwrap(), t);
    }

    #[test]
    fn header_roundtrip_without_markers() {
        let h = Header {
            parent: [1u8; 32],
            parent_state_root: [2u8; 32],
            extrinsic_hash: [3u8; 32],
            slot: 7,
            epoch_mark: None,
            tickets_mark: None,
            author_index: 2,
            entropy_source: [4u8; 96],
            seal: [5u8; 96],
        };
        assert_eq!(deserialize::<Header>(&serialize(&h)).unwrap(), h);
    }

    #[test]
    fn header_roundtrip_with_markers() {
        let h = Header {
            parent: [1u8; 32],
            parent_state_root: [2u8; 32],
            extrinsic_hash: [3u8; 32],
            slot: 12,
            epoch_mark: Some(EpochMarker {
                entropy: [9u8; 32],
                tickets_entropy: [8u8; 32],
                validators: vec![[1u8; 32], [2u8; 32]],
            }),
            tickets_mark: Some(vec![Ticket { id: [1u8; 32], attempt: 0 }]),
            author_index: 0,
            entropy_source: [4u8; 96],
            seal: [5u8; 96],
        };
        assert_eq!(deserialize::<Header>(&serialize(&h)).unwrap(), h);
    }

    #[test]
    fn empty_extrinsic_roundtrip() {
        let e = Extrinsic::default();
        assert_eq!(deserialize::<Extrinsic>(&serialize(&e)).unwrap(), e);
    }
}
