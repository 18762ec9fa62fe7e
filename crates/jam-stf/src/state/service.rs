//! Service accounts (δ) and privileges (χ).

use crate::codec::{Codec, Reader, Writer};
use crate::error::CodecError;
use crate::types::{Gas, Hash, ServiceId};
use std::collections::{HashMap, HashSet};

/// A single service account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceAccount {
    pub code_hash: Hash,
    pub balance: u64,
    pub min_gas_accumulate: Gas,
    pub min_gas_on_transfer: Gas,
    /// Merkle root of the service's own key/value storage.
    pub storage_root: Hash,
    /// Preimages solicited (requested but not yet provided) by hash.
    pub solicited_preimages: HashSet<Hash>,
    /// Preimages provided, with the slot at which they became available.
    pub available_preimages: HashMap<Hash, u32>,
    /// Declared item/byte footprint, used to compute the minimum balance.
    pub item_count: u32,
    pub byte_count: u64,
}

impl ServiceAccount {
    /// The minimum balance required by the declared storage footprint
    /// (§3 invariant on δ).
    pub fn minimum_balance(&self) -> u64 {
        const BASE_DEPOSIT: u64 = 100;
        const PER_ITEM: u64 = 10;
        const PER_BYTE: u64 = 1;
        BASE_DEPOSIT + PER_ITEM * self.item_count as u64 + PER_BYTE * self.byte_count
    }

    pub fn meets_minimum_balance(&self) -> bool {
        self.balance >= self.minimum_balance()
    }
}

/// χ: privileges — which service manages the privilege set itself, which
/// service may assign authorizers per core, which may designate the next
/// validator set, and which services are always accumulated each block
/// regardless of whether they have a ready work-report (§4.9 [ADDED]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Privileges {
    pub manager: Option<ServiceId>,
    pub assign: Vec<Option<ServiceId>>,
    pub designate: Option<ServiceId>,
    pub always_accumulate: HashMap<ServiceId, Gas>,
}

impl Privileges {
    pub fn with_core_count(core_count: usize) -> Self {
        Self {
            manager: None,
            assign: vec![None; core_count],
            designate: None,
            always_accumulate: HashMap::new(),
        }
    }
}

impl Codec for ServiceAccount {
    fn encode(&self, w: &mut Writer) {
        self.code_hash.encode(w);
        self.balance.encode(w);
        self.min_gas_accumulate.encode(w);
        self.min_gas_on_transfer.encode(w);
        self.storage_root.encode(w);
        self.solicited_preimages.encode(w);
        self.available_preimages.encode(w);
        self.item_count.encode(w);
        self.byte_count.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            code_hash: Codec::decode(r)?,
            balance: Codec::decode(r)?,
            min_gas_accumulate: Codec::decode(r)?,
            min_gas_on_transfer: Codec::decode(r)?,
            storage_root: Codec::decode(r)?,
            solicited_preimages: Codec::decode(r)?,
            available_preimages: Codec::decode(r)?,
            item_count: Codec::decode(r)?,
            byte_count: Codec::decode(r)?,
        })
    }
}

impl Codec for Privileges {
    fn encode(&self, w: &mut Writer) {
        self.manager.encode(w);
        self.assign.encode(w);
        self.designate.encode(w);
        self.always_accumulate.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            manager: Codec::decode(r)?,
            assign: Codec::decode(r)?,
            designate: Codec::decode(r)?,
            always_accumulate: Codec::decode(r)?,
        })
    }
}

pub type ServiceMap = HashMap<ServiceId, ServiceAccount>;

/// Per-core authorization pool (α) / queue (φ) state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorizations {
    /// α[c]: bounded pool of currently-spendable authorizer hashes.
    pub pool: Vec<Vec<Hash>>,
    /// φ[c]: fixed-length queue of Q authorizer hashes to rotate in.
    pub queue: Vec<Vec<Hash>>,
}

impl Authorizations {
    pub fn new(core_count: usize, queue_len: usize) -> Self {
        Self {
            pool: vec![Vec::new(); core_count],
            queue: vec![vec![Hash::default(); queue_len]; core_count],
        }
    }

    pub fn core_count(&self) -> usize {
        self.pool.len()
    }
}
