//! π: statistics (§4.13 [ADDED]). `spec.md` names π in the data model but
//! leaves its update rule unspecified; we give it the minimal rule needed
//! for it to be anything other than dead state — per-validator,
//! per-core, and per-service counters that roll over at epoch boundaries
//! the same way λ/κ do. Stats never cause a sub-step to fail.

use crate::types::{CoreIndex, Gas, ServiceId};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatorStats {
    pub blocks_authored: u32,
    pub tickets_submitted: u32,
    pub guarantees_signed: u32,
    pub assurances_signed: u32,
    pub preimages_provided: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreStats {
    pub bytes_reported: u64,
    pub gas_used: Gas,
    pub reports_processed: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub reports_accumulated: u32,
    pub gas_used: Gas,
    pub imports: u32,
    pub exports: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpochStats {
    pub validators: Vec<ValidatorStats>,
    pub cores: Vec<CoreStats>,
    pub services: HashMap<ServiceId, ServiceStats>,
}

impl EpochStats {
    pub fn with_shape(validator_count: usize, core_count: usize) -> Self {
        Self {
            validators: vec![ValidatorStats::default(); validator_count],
            cores: vec![CoreStats::default(); core_count],
            services: HashMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub current: EpochStats,
    pub previous: EpochStats,
}

impl Statistics {
    pub fn with_shape(validator_count: usize, core_count: usize) -> Self {
        Self {
            current: EpochStats::with_shape(validator_count, core_count),
            previous: EpochStats::with_shape(validator_count, core_count),
        }
    }

    /// Roll `current` into `previous` and zero `current` at an epoch
    /// boundary, mirroring λ ← κ.
    pub fn roll_epoch(&mut self, validator_count: usize, core_count: usize) {
        self.previous = std::mem::replace(
            &mut self.current,
            EpochStats::with_shape(validator_count, core_count),
        );
    }

    pub fn record_core_report(&mut self, core: CoreIndex, bytes: u64, gas: Gas) {
        if let Some(c) = self.current.cores.get_mut(core as usize) {
            c.bytes_reported += bytes;
            c.gas_used += gas;
            c.reports_processed += 1;
        }
    }

    pub fn record_service_accumulation(&mut self, service: ServiceId, gas: Gas) {
        let entry = self.current.services.entry(service).or_default();
        entry.reports_accumulated += 1;
        entry.gas_used += gas;
    }
}
