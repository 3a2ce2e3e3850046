//! The structured configuration the ceremony orchestrator accepts.
//!
//! Every recognized option from the external interface is an explicit
//! field with a documented default. Unknown keys are rejected so a typo
//! in an operator's YAML file surfaces immediately instead of silently
//! falling back to a default.

use serde::{Deserialize, Serialize};

use crate::algorithm::{ALG_RSA_SHA256, AlgorithmParams, AlgorithmPolicyEntry};
use crate::duration::IsoDuration;
use crate::errors::CoreError;
use crate::inventory::KeyInventory;
use crate::policy::SignaturePolicy;

/// All policy and behavior toggles the orchestrator consults. Field
/// names match the external interface exactly so a YAML config file reads
/// the same as the specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CeremonyConfig {
    #[serde(default = "default_num_bundles")]
    pub num_bundles: usize,

    #[serde(default = "default_num_keys_per_bundle")]
    pub num_keys_per_bundle: Vec<usize>,

    #[serde(default = "default_num_different_keys")]
    pub num_different_keys_in_all_bundles: usize,

    #[serde(default = "default_acceptable_domains")]
    pub acceptable_domains: Vec<String>,

    #[serde(default = "default_true")]
    pub validate_signatures: bool,

    #[serde(default = "default_true")]
    pub keys_match_zsk_policy: bool,

    #[serde(default = "default_false")]
    pub enable_unsupported_ecdsa: bool,

    #[serde(default = "default_true")]
    pub check_cycle_length: bool,

    #[serde(default = "default_min_cycle_inception_length")]
    pub min_cycle_inception_length: IsoDuration,

    #[serde(default = "default_max_cycle_inception_length")]
    pub max_cycle_inception_length: IsoDuration,

    #[serde(default = "default_min_bundle_interval")]
    pub min_bundle_interval: IsoDuration,

    #[serde(default = "default_max_bundle_interval")]
    pub max_bundle_interval: IsoDuration,

    #[serde(default = "default_true")]
    pub rsa_exponent_match_zsk_policy: bool,

    #[serde(default = "default_true")]
    pub check_bundle_overlap: bool,

    #[serde(default = "default_true")]
    pub signature_validity_match_zsk_policy: bool,

    #[serde(default = "default_true")]
    pub signature_algorithms_match_zsk_policy: bool,

    #[serde(default = "default_true")]
    pub check_keys_match_ksk_operator_policy: bool,

    /// `0` means "use the KSK policy's own TTL"; resolved in `validate`.
    #[serde(default)]
    pub dns_ttl: u32,

    #[serde(default = "default_true")]
    pub signature_check_expire_horizon: bool,

    #[serde(default = "default_signature_horizon_days")]
    pub signature_horizon_days: u32,

    #[serde(default = "default_true")]
    pub check_bundle_intervals: bool,

    #[serde(default = "default_true")]
    pub check_chain_keys: bool,

    #[serde(default = "default_true")]
    pub check_chain_overlap: bool,

    #[serde(default = "default_approved_algorithms")]
    pub approved_algorithms: Vec<u8>,

    #[serde(default = "default_rsa_approved_exponents")]
    pub rsa_approved_exponents: Vec<u64>,

    #[serde(default = "default_rsa_approved_key_sizes")]
    pub rsa_approved_key_sizes: Vec<u32>,

    #[serde(default)]
    pub schema_name: Option<String>,

    #[serde(default)]
    pub inventory: KeyInventory,

    /// The KSK operator's own signature policy, echoed into every produced
    /// `ResponsePolicy.KSK` block and checked by `KeysMatchKskPolicy`.
    #[serde(default = "default_ksk_policy")]
    pub ksk_policy: SignaturePolicy,
}

fn default_num_bundles() -> usize {
    9
}
fn default_num_keys_per_bundle() -> Vec<usize> {
    vec![2, 1, 1, 1, 1, 1, 1, 1, 2]
}
fn default_num_different_keys() -> usize {
    3
}
fn default_acceptable_domains() -> Vec<String> {
    vec![".".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_min_cycle_inception_length() -> IsoDuration {
    IsoDuration::from_days(79)
}
fn default_max_cycle_inception_length() -> IsoDuration {
    IsoDuration::from_days(81)
}
fn default_min_bundle_interval() -> IsoDuration {
    IsoDuration::from_days(9)
}
fn default_max_bundle_interval() -> IsoDuration {
    IsoDuration::from_days(11)
}
fn default_signature_horizon_days() -> u32 {
    180
}
fn default_approved_algorithms() -> Vec<u8> {
    vec![ALG_RSA_SHA256]
}
fn default_rsa_approved_exponents() -> Vec<u64> {
    vec![65537]
}
fn default_rsa_approved_key_sizes() -> Vec<u32> {
    vec![2048]
}
fn default_ksk_policy() -> SignaturePolicy {
    SignaturePolicy {
        publish_safety: IsoDuration::from_days(2),
        retire_safety: IsoDuration::from_days(2),
        max_signature_validity: IsoDuration::from_days(21),
        min_signature_validity: IsoDuration::from_days(19),
        max_validity_overlap: IsoDuration::from_days(11),
        min_validity_overlap: IsoDuration::from_days(9),
        algorithm_policy: vec![AlgorithmPolicyEntry {
            algorithm: ALG_RSA_SHA256,
            params: AlgorithmParams::Rsa {
                size: 2048,
                exponent: 65537,
            },
        }],
    }
}

impl Default for CeremonyConfig {
    fn default() -> Self {
        Self {
            num_bundles: default_num_bundles(),
            num_keys_per_bundle: default_num_keys_per_bundle(),
            num_different_keys_in_all_bundles: default_num_different_keys(),
            acceptable_domains: default_acceptable_domains(),
            validate_signatures: true,
            keys_match_zsk_policy: true,
            enable_unsupported_ecdsa: false,
            check_cycle_length: true,
            min_cycle_inception_length: default_min_cycle_inception_length(),
            max_cycle_inception_length: default_max_cycle_inception_length(),
            min_bundle_interval: default_min_bundle_interval(),
            max_bundle_interval: default_max_bundle_interval(),
            rsa_exponent_match_zsk_policy: true,
            check_bundle_overlap: true,
            signature_validity_match_zsk_policy: true,
            signature_algorithms_match_zsk_policy: true,
            check_keys_match_ksk_operator_policy: true,
            dns_ttl: 0,
            signature_check_expire_horizon: true,
            signature_horizon_days: default_signature_horizon_days(),
            check_bundle_intervals: true,
            check_chain_keys: true,
            check_chain_overlap: true,
            approved_algorithms: default_approved_algorithms(),
            rsa_approved_exponents: default_rsa_approved_exponents(),
            rsa_approved_key_sizes: default_rsa_approved_key_sizes(),
            schema_name: None,
            inventory: KeyInventory::default(),
            ksk_policy: default_ksk_policy(),
        }
    }
}

impl CeremonyConfig {
    /// Structural validation independent of any particular KSR: catches
    /// configuration errors before a ceremony ever touches the HSM.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.num_bundles == 0 {
            return Err(CoreError::ConfigurationError(
                "num_bundles must be at least 1".into(),
            ));
        }
        if self.num_keys_per_bundle.len() != self.num_bundles {
            return Err(CoreError::ConfigurationError(format!(
                "num_keys_per_bundle has {} entries but num_bundles is {}",
                self.num_keys_per_bundle.len(),
                self.num_bundles
            )));
        }
        if self.acceptable_domains.is_empty() {
            return Err(CoreError::ConfigurationError(
                "acceptable_domains must not be empty".into(),
            ));
        }
        if self.approved_algorithms.is_empty() {
            return Err(CoreError::ConfigurationError(
                "approved_algorithms must not be empty".into(),
            ));
        }
        if self.min_bundle_interval > self.max_bundle_interval {
            return Err(CoreError::ConfigurationError(
                "min_bundle_interval must not exceed max_bundle_interval".into(),
            ));
        }
        if self.min_cycle_inception_length > self.max_cycle_inception_length {
            return Err(CoreError::ConfigurationError(
                "min_cycle_inception_length must not exceed max_cycle_inception_length".into(),
            ));
        }
        if self.inventory.entries.is_empty() {
            return Err(CoreError::ConfigurationError(
                "inventory must declare at least one KSK".into(),
            ));
        }
        Ok(())
    }

    pub fn approves(&self, algorithm: u8, params: &AlgorithmParams) -> bool {
        if !self.approved_algorithms.contains(&algorithm) {
            return false;
        }
        match params {
            AlgorithmParams::Rsa { size, exponent } => {
                self.rsa_approved_key_sizes.contains(size)
                    && self.rsa_approved_exponents.contains(exponent)
            }
            AlgorithmParams::Ecdsa { .. } => self.enable_unsupported_ecdsa,
            AlgorithmParams::Dsa { .. } => false,
        }
    }
}
