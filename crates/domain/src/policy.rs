use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmPolicyEntry;
use crate::duration::IsoDuration;

/// A signature policy, as declared under `RequestPolicy.ZSK` or
/// `ResponsePolicy.{KSK,ZSK}`.
///
/// `ResponsePolicy.ZSK` is always a byte-for-byte echo of
/// `RequestPolicy.ZSK` (see design notes); both are represented by this
/// same owned record rather than by a type hierarchy, so a document can
/// simply clone the one instance it parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePolicy {
    pub publish_safety: IsoDuration,
    pub retire_safety: IsoDuration,
    pub max_signature_validity: IsoDuration,
    pub min_signature_validity: IsoDuration,
    pub max_validity_overlap: IsoDuration,
    pub min_validity_overlap: IsoDuration,
    pub algorithm_policy: Vec<AlgorithmPolicyEntry>,
}

impl SignaturePolicy {
    /// True if `algorithm`/`params` match one of the declared
    /// `algorithm_policy` entries exactly.
    pub fn allows(&self, algorithm: u8, params: crate::algorithm::AlgorithmParams) -> bool {
        self.algorithm_policy
            .iter()
            .any(|entry| entry.algorithm == algorithm && entry.params == params)
    }
}

/// The policy block of a `Request` document: only a ZSK policy, since the
/// ZSK operator has not yet been handed any KSK material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPolicy {
    pub zsk: SignaturePolicy,
}

/// The policy block of a `Response` document: both the echoed ZSK policy
/// and the KSK operator's own signing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePolicy {
    pub ksk: SignaturePolicy,
    pub zsk: SignaturePolicy,
}
