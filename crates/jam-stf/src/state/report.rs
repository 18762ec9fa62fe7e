//! Work-report shaped types shared by guarantees (§4.7), assurances
//! (§4.8), and accumulation (§4.9).

use crate::codec::{Codec, Reader, Writer};
use crate::error::CodecError;
use crate::types::{CoreIndex, Ed25519Key, Gas, Hash, ServiceId, TimeSlot};

/// One service's declared work-result within a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkResult {
    pub service_id: ServiceId,
    pub code_hash: Hash,
    pub payload_hash: Hash,
    pub accumulate_gas: Gas,
    pub output: WorkOutput,
}

/// The opaque PVM invocation outcome for one service item (§1's "the STF
/// calls it as an opaque function returning `(gas_used, result |
/// failure)`").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkOutput {
    Success { gas_used: Gas, output_hash: Hash },
    Failure { gas_used: Gas },
}

/// The output of refining a work-package on a core — the unit of
/// availability and accumulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkReport {
    pub package_hash: Hash,
    pub core_index: CoreIndex,
    pub authorizer_hash: Hash,
    pub auth_output: Vec<u8>,
    /// Anchor block hash this report was built against.
    pub anchor: Hash,
    pub anchor_state_root: Hash,
    pub anchor_beefy_root: Hash,
    /// Guarantee slot (when the guarantors signed it).
    pub slot: TimeSlot,
    pub prerequisites: Vec<Hash>,
    pub segment_root_lookup: Vec<Hash>,
    pub results: Vec<WorkResult>,
}

impl WorkReport {
    pub fn dependencies(&self) -> Vec<Hash> {
        let mut deps = self.prerequisites.clone();
        deps.extend(self.segment_root_lookup.iter().copied());
        deps
    }

    pub fn total_accumulate_gas(&self) -> Gas {
        self.results.iter().map(|r| r.accumulate_gas).sum()
    }

    pub fn serialized_output_size(&self) -> usize {
        let results_size: usize = self
            .results
            .iter()
            .map(|r| match &r.output {
                WorkOutput::Success { output_hash, .. } => output_hash.len(),
                WorkOutput::Failure { .. } => 0,
            })
            .sum();
        self.auth_output.len() + results_size
    }
}

/// A pending report awaiting availability, stored per core in ρ.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingReport {
    pub report: WorkReport,
    pub timeout: TimeSlot,
}

/// One guarantor's signature over a reported work-report (§4.7 rule 7).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuarantorSignature {
    pub validator_index: u16,
    pub signature: [u8; 64],
}

/// One guarantee extrinsic entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guarantee {
    pub report: WorkReport,
    pub signatures: Vec<GuarantorSignature>,
}

/// One assurance extrinsic entry (§4.8).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assurance {
    pub validator_index: u16,
    pub anchor: Hash,
    pub bitfield: Vec<u8>,
    pub signature: [u8; 64],
}

impl Assurance {
    pub fn bit_set(&self, core: CoreIndex) -> bool {
        let idx = core as usize;
        let byte = idx / 8;
        let bit = idx % 8;
        self.bitfield
            .get(byte)
            .map(|b| (b >> bit) & 1 == 1)
            .unwrap_or(false)
    }
}

/// A ready-queue entry (ϑ): a report plus the dependency hashes it is
/// still waiting on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadyEntry {
    pub report: WorkReport,
    pub dependencies: Vec<Hash>,
}

/// An offender's Ed25519 key, recorded by disputes (§4.6).
pub type OffenderKey = Ed25519Key;

impl Codec for PendingReport {
    fn encode(&self, w: &mut Writer) {
        self.report.encode(w);
        self.timeout.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            report: Codec::decode(r)?,
            timeout: Codec::decode(r)?,
        })
    }
}
