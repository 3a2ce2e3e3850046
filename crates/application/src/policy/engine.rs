//! Composes the enabled subset of [`Check`]s for a given [`CeremonyConfig`]
//! and runs every one of them to completion, collecting violations rather
//! than stopping at the first failure — an operator reviewing a rejected
//! KSR wants the whole list, not one check at a time.

use ksr_ceremony_domain::CoreError;

use super::checks::{
    AcceptableDomain, ApprovedAlgorithms, Check, CheckBundleIntervals, CheckBundleOverlap,
    CheckChainKeys, CheckChainOverlap, CheckCycleLength, CheckKeyTags, KeysMatchKskPolicy,
    KeysMatchZskPolicy, NumBundles, NumDistinctKeys, NumKeysPerBundle,
    SignatureAlgorithmsMatchZskPolicy, SignatureExpireHorizon, SignatureValidityMatchZskPolicy,
    ValidateSignatures,
};
use super::context::PolicyContext;

pub struct PolicyEngine {
    checks: Vec<Box<dyn Check>>,
}

impl PolicyEngine {
    /// Builds the engine's check list from `config`'s toggles. A check
    /// that has no corresponding toggle (structural checks like
    /// `NumBundles`) always runs.
    pub fn from_config(config: &ksr_ceremony_domain::CeremonyConfig) -> Self {
        let mut checks: Vec<Box<dyn Check>> = vec![
            Box::new(AcceptableDomain {
                acceptable: config.acceptable_domains.clone(),
            }),
            Box::new(NumBundles),
            Box::new(NumKeysPerBundle),
            Box::new(NumDistinctKeys),
            Box::new(CheckKeyTags),
            Box::new(ApprovedAlgorithms),
        ];

        if config.keys_match_zsk_policy {
            checks.push(Box::new(KeysMatchZskPolicy {
                rsa_exponent_must_match: config.rsa_exponent_match_zsk_policy,
            }));
        }
        if config.check_keys_match_ksk_operator_policy {
            checks.push(Box::new(KeysMatchKskPolicy));
        }
        if config.signature_algorithms_match_zsk_policy {
            checks.push(Box::new(SignatureAlgorithmsMatchZskPolicy));
        }
        if config.signature_validity_match_zsk_policy {
            checks.push(Box::new(SignatureValidityMatchZskPolicy));
        }
        if config.check_bundle_overlap {
            checks.push(Box::new(CheckBundleOverlap));
        }
        if config.check_bundle_intervals {
            checks.push(Box::new(CheckBundleIntervals));
        }
        if config.check_cycle_length {
            checks.push(Box::new(CheckCycleLength));
        }
        if config.signature_check_expire_horizon {
            checks.push(Box::new(SignatureExpireHorizon));
        }
        if config.check_chain_keys {
            checks.push(Box::new(CheckChainKeys));
        }
        if config.check_chain_overlap {
            checks.push(Box::new(CheckChainOverlap));
        }
        // cryptographic verification last: everything before it is a cheap
        // structural read, and the complete violation set is reported anyway
        if config.validate_signatures {
            checks.push(Box::new(ValidateSignatures));
        }

        Self { checks }
    }

    /// Runs every enabled check against `ctx`, logging each violation as it
    /// is found, and returns `Ok(())` only if none fired.
    pub fn evaluate(&self, ctx: &PolicyContext) -> Result<(), CoreError> {
        let mut violations = Vec::new();
        for check in &self.checks {
            let found = check.run(ctx);
            for violation in &found {
                tracing::warn!(check = check.name(), %violation, "policy violation");
            }
            violations.extend(found);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::PolicyViolation(violations))
        }
    }
}
