//! Protocol parameters.
//!
//! `spec.md` fixes these at compile time (C, V, E, R, Y, N, K, H, O, Q, U, J,
//! L). We carry them as a runtime value instead so the same binary can run
//! both the normative parameter set and the much smaller "tiny" set used by
//! test vectors, the way the teacher's own MVP keeps block-time and gas
//! budgets as `pub const` but a real network additionally needs a
//! network-specific preset.
//!
//! `Config` is `Deserialize`-able behind the `serde` feature so a node
//! binary can load a preset from a TOML or JSON file the way the teacher's
//! own wallet config round-trips through `toml::from_str`/`serde_json`,
//! falling back to [`Config::default`] when none is given.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol-wide constants bound for one chain instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// C — number of cores.
    pub core_count: u16,
    /// V — number of validators.
    pub validator_count: u16,
    /// E — epoch length in slots.
    pub epoch_length: u32,
    /// R — validator rotation period in slots.
    pub rotation_period: u32,
    /// Y — ticket-submission end offset within an epoch.
    pub ticket_submission_end: u32,
    /// N — max ticket attempts per validator.
    pub max_ticket_attempts: u8,
    /// K — max tickets per extrinsic.
    pub max_tickets_per_extrinsic: u32,
    /// H — recent-history depth.
    pub recent_history_depth: usize,
    /// O — max authorizations pool items per core.
    pub max_auth_pool_items: usize,
    /// Q — max authorizations queue items per core.
    pub max_auth_queue_items: usize,
    /// U — work report replacement period, in slots.
    pub work_report_timeout: u32,
    /// J — max work-report dependencies.
    pub max_dependencies: usize,
    /// L — max lookup-anchor age, in slots.
    pub max_lookup_anchor_age: u32,
    /// Maximum serialized size of a work-report's outputs, in bytes.
    pub max_work_report_size: usize,
    /// Per-core accumulate-gas budget for one block.
    pub max_gas_per_core: u64,
}

impl Config {
    /// V_s — the super-majority threshold, `2V/3 + 1`.
    pub fn supermajority(&self) -> usize {
        (2 * self.validator_count as usize) / 3 + 1
    }

    /// Normative full-size parameter set.
    pub const fn full() -> Self {
        Self {
            core_count: 341,
            validator_count: 1023,
            epoch_length: 600,
            rotation_period: 10,
            ticket_submission_end: 500,
            max_ticket_attempts: 2,
            max_tickets_per_extrinsic: 16,
            recent_history_depth: 8,
            max_auth_pool_items: 8,
            max_auth_queue_items: 80,
            work_report_timeout: 5,
            max_dependencies: 8,
            max_lookup_anchor_age: 14_400,
            max_work_report_size: 48 * 1024,
            max_gas_per_core: 3_500_000_000,
        }
    }

    /// Small parameter set used by unit and scenario tests.
    pub const fn tiny() -> Self {
        Self {
            core_count: 2,
            validator_count: 6,
            epoch_length: 12,
            rotation_period: 4,
            ticket_submission_end: 10,
            max_ticket_attempts: 3,
            max_tickets_per_extrinsic: 3,
            recent_history_depth: 4,
            max_auth_pool_items: 4,
            max_auth_queue_items: 4,
            work_report_timeout: 3,
            max_dependencies: 4,
            max_lookup_anchor_age: 24,
            max_work_report_size: 4096,
            max_gas_per_core: 1_000_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "serde")]
impl Config {
    /// Parse a TOML-encoded config, the format the teacher's own CLI
    /// binaries use for on-disk settings.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Parse a JSON-encoded config.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn tiny_config_round_trips_through_toml() {
        let cfg = Config::tiny();
        let encoded = toml::to_string_pretty(&cfg).unwrap();
        let decoded = Config::from_toml_str(&encoded).unwrap();
        assert_eq!(cfg, decoded);
    }

    #[test]
    fn tiny_config_round_trips_through_json() {
        let cfg = Config::tiny();
        let encoded = serde_json::to_string(&cfg).unwrap();
        let decoded = Config::from_json_str(&encoded).unwrap();
        assert_eq!(cfg, decoded);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = Config::from_toml_str("not valid toml {{{").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
