//! DNSSEC algorithm numbers and the parameters each one carries.
//!
//! Mirrors the algorithm-number switch a DNSSEC crypto module keys off of
//! (`8 => RSA/SHA-256`, `13 => ECDSA P-256`), but models the parameters as
//! data instead of a string tag so the policy engine can compare declared
//! key sizes and exponents structurally.

use serde::{Deserialize, Serialize};

/// RFC 4034 / IANA DNSSEC algorithm numbers used by this ceremony.
pub const ALG_DSA_SHA1: u8 = 3;
pub const ALG_RSA_SHA256: u8 = 8;
pub const ALG_ECDSA_P256_SHA256: u8 = 13;

/// Algorithm-specific parameters declared in a `SignatureAlgorithm` policy
/// entry or carried alongside a KSK inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum AlgorithmParams {
    Rsa { size: u32, exponent: u64 },
    Dsa { size: u32 },
    Ecdsa { size: u32 },
}

impl AlgorithmParams {
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            AlgorithmParams::Rsa { .. } => "RSA",
            AlgorithmParams::Dsa { .. } => "DSA",
            AlgorithmParams::Ecdsa { .. } => "ECDSA",
        }
    }
}

/// Pairs an algorithm number with its parameters, as declared in a
/// `SignatureAlgorithm` policy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmPolicyEntry {
    pub algorithm: u8,
    pub params: AlgorithmParams,
}

pub fn algorithm_display_name(algorithm: u8) -> &'static str {
    match algorithm {
        ALG_RSA_SHA256 => "RSASHA256",
        ALG_ECDSA_P256_SHA256 => "ECDSAP256SHA256",
        _ => "UNKNOWN",
    }
}
