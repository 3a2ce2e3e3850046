use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmParams;

/// A configured KSK, as an operator declares it in the ceremony config —
/// not yet reconciled against what the HSM actually holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KskInventoryEntry {
    pub identifier: String,
    pub description: String,
    /// HSM lookup label; passed to `Signer::list`.
    pub label: String,
    pub key_tag: u16,
    pub algorithm: u8,
    pub params: AlgorithmParams,
    pub valid_from: u32,
    pub valid_until: Option<u32>,
    /// SHA-256 DS digest, hex-encoded in config, decoded here.
    #[serde(with = "hex_digest")]
    pub ds_sha256: Vec<u8>,
}

impl KskInventoryEntry {
    pub fn is_valid_at(&self, now: u32) -> bool {
        now >= self.valid_from && self.valid_until.map_or(true, |until| now <= until)
    }
}

mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.trim()).map_err(serde::de::Error::custom)
    }
}

/// The full set of configured KSKs, keyed by `identifier`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyInventory {
    pub entries: Vec<KskInventoryEntry>,
}

impl KeyInventory {
    pub fn find(&self, identifier: &str) -> Option<&KskInventoryEntry> {
        self.entries.iter().find(|e| e.identifier == identifier)
    }

    pub fn valid_at(&self, now: u32) -> impl Iterator<Item = &KskInventoryEntry> {
        self.entries.iter().filter(move |e| e.is_valid_at(now))
    }
}
