use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::signature::Signature;

/// A time-bounded slot within a cycle, containing the DNSKEY RRset valid
/// in that window plus the signatures over it.
///
/// `signer` hints are only meaningful on request bundles (they name which
/// ZSK key identifiers the ZSK operator intends to use); response bundles
/// leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    pub inception: u32,
    pub expiration: u32,
    pub keys: Vec<Key>,
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub signer_hints: Vec<String>,
}

impl Bundle {
    pub fn key_by_identifier(&self, key_identifier: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.key_identifier == key_identifier)
    }

    /// Keys sorted by canonical RDATA byte order, the order an emitted
    /// bundle's RRset must follow.
    pub fn keys_canonical_order(&self) -> Vec<&Key> {
        let mut keys: Vec<&Key> = self.keys.iter().collect();
        keys.sort_by(|a, b| a.canonical_rdata().cmp(&b.canonical_rdata()));
        keys
    }

    /// Signatures sorted by `(key_tag, algorithm)`, the order an emitted
    /// bundle's signature set must follow.
    pub fn signatures_canonical_order(&self) -> Vec<&Signature> {
        let mut signatures: Vec<&Signature> = self.signatures.iter().collect();
        signatures.sort_by_key(|s| (s.key_tag, s.algorithm));
        signatures
    }

    pub fn duration_seconds(&self) -> i64 {
        i64::from(self.expiration) - i64::from(self.inception)
    }
}
