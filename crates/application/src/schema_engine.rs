//! Resolves a named schema and slot number against a concrete
//! [`KeyInventory`], turning the schema's bare identifier strings into
//! actual inventory entries and rejecting anything the schema references
//! that the inventory does not declare.

use ksr_ceremony_domain::{CoreError, KeyInventory, KskInventoryEntry, SchemaTable, schema::named_schema};

/// A bundle slot's signing plan, with every identifier resolved to the
/// inventory entry it names.
pub struct ResolvedSlot<'a> {
    pub publish: Vec<&'a KskInventoryEntry>,
    pub sign: Vec<&'a KskInventoryEntry>,
    pub revoke: Vec<&'a KskInventoryEntry>,
}

pub struct SchemaEngine<'a> {
    table: SchemaTable,
    inventory: &'a KeyInventory,
}

impl<'a> SchemaEngine<'a> {
    pub fn load(name: &str, inventory: &'a KeyInventory) -> Result<Self, CoreError> {
        let table = named_schema(name)
            .ok_or_else(|| CoreError::ConfigurationError(format!("unknown schema name {name:?}")))?;
        Ok(Self { table, inventory })
    }

    /// Resolves the 1-based `slot_number`'s plan, validating that every
    /// identifier the schema names exists in the inventory and that the
    /// signer set is a subset of what that slot publishes or revokes.
    ///
    /// A KSK whose validity window has closed by `now` may only appear in
    /// the slot's `revoke` set — its one remaining legitimate job is to
    /// announce its own revocation.
    pub fn resolve(&self, slot_number: usize, now: u32) -> Result<ResolvedSlot<'a>, CoreError> {
        let slot = self.table.slot(slot_number).ok_or_else(|| {
            CoreError::ConfigurationError(format!("schema has no definition for slot {slot_number}"))
        })?;

        for signer in &slot.sign {
            if !slot.publish.contains(signer) && !slot.revoke.contains(signer) {
                return Err(CoreError::ConfigurationError(format!(
                    "schema slot {slot_number} signs with {signer:?}, which it neither publishes nor revokes"
                )));
            }
        }

        let resolved = ResolvedSlot {
            publish: self.resolve_ids(&slot.publish)?,
            sign: self.resolve_ids(&slot.sign)?,
            revoke: self.resolve_ids(&slot.revoke)?,
        };

        for entry in resolved.publish.iter().chain(resolved.sign.iter()) {
            let revoked_here = resolved.revoke.iter().any(|r| r.identifier == entry.identifier);
            if !entry.is_valid_at(now) && !revoked_here {
                return Err(CoreError::ConfigurationError(format!(
                    "schema slot {slot_number} uses {:?} outside its validity window and not for revocation",
                    entry.identifier
                )));
            }
        }

        Ok(resolved)
    }

    pub fn slot_count(&self) -> usize {
        self.table.slots.len()
    }

    fn resolve_ids(&self, ids: &[String]) -> Result<Vec<&'a KskInventoryEntry>, CoreError> {
        ids.iter()
            .map(|id| {
                self.inventory.find(id).ok_or_else(|| {
                    CoreError::ConfigurationError(format!(
                        "schema references KSK identifier {id:?}, which is not in the inventory"
                    ))
                })
            })
            .collect()
    }
}
