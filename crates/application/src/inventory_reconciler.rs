//! Reconciles the operator-declared [`KeyInventory`] against what the HSM
//! actually holds, before any signing happens.
//!
//! The inventory declares what a KSK *should* be: its key tag, algorithm,
//! and DS digest. This module never trusts that declaration — it asks the
//! [`Signer`] for the real public key material, recomputes both values
//! from scratch, and fails closed on any mismatch.

use ksr_ceremony_domain::canonical::ds_sha256_digest;
use ksr_ceremony_domain::key::{DNSKEY_PROTOCOL, FLAG_SEP, FLAG_ZONE_KEY};
use ksr_ceremony_domain::{CoreError, Key, KeyInventory};

use crate::ports::{HandleKind, Signer};

/// Checks every inventory entry valid at `now` against the HSM, returning
/// the first mismatch. A ceremony never proceeds past a partial
/// reconciliation failure.
pub fn reconcile(
    inventory: &KeyInventory,
    signer: &dyn Signer,
    owner_name: &str,
    now: u32,
) -> Result<(), CoreError> {
    for entry in inventory.valid_at(now) {
        let handles = signer.list(&entry.label)?;
        let public_handle = handles
            .iter()
            .find(|h| h.kind == HandleKind::Public)
            .ok_or_else(|| CoreError::InventoryMismatch {
                identifier: entry.identifier.clone(),
                reason: format!("no public key handle registered under label {:?}", entry.label),
            })?;

        let material = signer.public_key(public_handle)?;

        if material.algorithm != entry.algorithm || material.params != entry.params {
            return Err(CoreError::InventoryMismatch {
                identifier: entry.identifier.clone(),
                reason: format!(
                    "HSM reports algorithm {} / {:?}, inventory declares {} / {:?}",
                    material.algorithm, material.params, entry.algorithm, entry.params
                ),
            });
        }

        let key = Key {
            key_identifier: entry.identifier.clone(),
            key_tag: 0,
            ttl: 0,
            flags: FLAG_ZONE_KEY | FLAG_SEP,
            protocol: DNSKEY_PROTOCOL,
            algorithm: material.algorithm,
            public_key: material.raw_bytes,
        };

        let key_tag = key.compute_key_tag();
        if key_tag != entry.key_tag {
            return Err(CoreError::InventoryMismatch {
                identifier: entry.identifier.clone(),
                reason: format!("HSM key tag {key_tag} disagrees with inventory key tag {}", entry.key_tag),
            });
        }

        let digest = ds_sha256_digest(owner_name, &key);
        if digest != entry.ds_sha256 {
            return Err(CoreError::InventoryMismatch {
                identifier: entry.identifier.clone(),
                reason: "HSM public key's DS digest disagrees with the inventory's declared digest".into(),
            });
        }
    }

    Ok(())
}
