//! Static named signing schemas.
//!
//! A schema maps each 1-based bundle slot to the set of KSK identifiers to
//! publish, publish revoked, and sign with. The tables below are fixed at
//! compile time; the `+` variant of each schema repeats slot 9's policy
//! across every later slot so a ceremony cycle can be extended without
//! advancing to the next phase.

use serde::{Deserialize, Serialize};

/// What a single bundle slot does, under a given schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSlot {
    pub publish: Vec<String>,
    pub sign: Vec<String>,
    pub revoke: Vec<String>,
}

impl SchemaSlot {
    fn publish(ids: &[&str]) -> Self {
        Self {
            publish: ids.iter().map(|s| s.to_string()).collect(),
            sign: Vec::new(),
            revoke: Vec::new(),
        }
    }

    fn signing(mut self, ids: &[&str]) -> Self {
        self.sign = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    fn revoking(mut self, ids: &[&str]) -> Self {
        self.revoke = ids.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A full named schema: one [`SchemaSlot`] per bundle, 1-indexed in the
/// configuration surface but stored 0-indexed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
    pub slots: Vec<SchemaSlot>,
}

impl SchemaTable {
    /// Returns the slot for 1-based bundle index `slot`, extending with
    /// the last defined slot's policy if `slot` exceeds the table (the
    /// behavior the `+` schema variants exist to make explicit).
    pub fn slot(&self, slot: usize) -> Option<&SchemaSlot> {
        if slot == 0 {
            return None;
        }
        self.slots.get(slot - 1).or_else(|| self.slots.last())
    }
}

/// `normal`: a single KSK, `ksk_current`, publishes and signs every slot.
fn normal() -> SchemaTable {
    let slot = SchemaSlot::publish(&["ksk_current"]).signing(&["ksk_current"]);
    SchemaTable {
        slots: vec![slot; 9],
    }
}

/// `pre-publish`: `ksk_next` appears in the RRset from slot 2 onward but
/// never signs — it is being pre-published so validators cache it ahead
/// of the rollover.
fn pre_publish() -> SchemaTable {
    let first = SchemaSlot::publish(&["ksk_current"]).signing(&["ksk_current"]);
    let rest = SchemaSlot::publish(&["ksk_current", "ksk_next"]).signing(&["ksk_current"]);
    let mut slots = vec![first];
    slots.extend(std::iter::repeat(rest).take(8));
    SchemaTable { slots }
}

/// `rollover`: both KSKs stay published throughout; signing authority
/// moves from `ksk_current` to `ksk_next` after slot 1.
fn rollover() -> SchemaTable {
    let first = SchemaSlot::publish(&["ksk_current", "ksk_next"]).signing(&["ksk_current"]);
    let rest = SchemaSlot::publish(&["ksk_current", "ksk_next"]).signing(&["ksk_next"]);
    let mut slots = vec![first];
    slots.extend(std::iter::repeat(rest).take(8));
    SchemaTable { slots }
}

/// `revoke`: `ksk_current` is published with the REVOKE bit set for the
/// middle of the cycle while still co-signing the transition, then drops
/// out; `ksk_next` takes over exclusively by the final slot.
fn revoke() -> SchemaTable {
    let first = SchemaSlot::publish(&["ksk_current", "ksk_next"]).signing(&["ksk_current"]);
    let middle = SchemaSlot::publish(&["ksk_next"])
        .revoking(&["ksk_current"])
        .signing(&["ksk_current", "ksk_next"]);
    let last = SchemaSlot::publish(&["ksk_next"]).signing(&["ksk_next"]);

    let mut slots = vec![first];
    slots.extend(std::iter::repeat(middle).take(7));
    slots.push(last);
    SchemaTable { slots }
}

/// Resolves a schema name, including the `+` (extend current phase)
/// variants, to its static table. Returns `None` for an unrecognized
/// name — the schema engine turns that into a `ConfigurationError`.
pub fn named_schema(name: &str) -> Option<SchemaTable> {
    match name {
        "normal" | "normal+" => Some(normal()),
        "pre-publish" | "pre-publish+" => Some(pre_publish()),
        "rollover" | "rollover+" => Some(rollover()),
        "revoke" | "revoke+" => Some(revoke()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_schema_has_nine_slots_all_identical() {
        let table = normal();
        assert_eq!(table.slots.len(), 9);
        assert!(table.slots.iter().all(|s| s.publish == vec!["ksk_current"]));
    }

    #[test]
    fn pre_publish_introduces_ksk_next_from_slot_two() {
        let table = pre_publish();
        assert_eq!(table.slot(1).unwrap().publish, vec!["ksk_current"]);
        assert_eq!(
            table.slot(2).unwrap().publish,
            vec!["ksk_current", "ksk_next"]
        );
    }

    #[test]
    fn revoke_schema_sets_revoke_only_in_middle_slots() {
        let table = revoke();
        assert!(table.slot(1).unwrap().revoke.is_empty());
        assert_eq!(table.slot(5).unwrap().revoke, vec!["ksk_current"]);
        assert!(table.slot(9).unwrap().revoke.is_empty());
    }

    #[test]
    fn every_schema_sign_set_is_subset_of_publish_or_revoke() {
        for name in ["normal", "pre-publish", "rollover", "revoke"] {
            let table = named_schema(name).unwrap();
            for (i, slot) in table.slots.iter().enumerate() {
                for signer in &slot.sign {
                    assert!(
                        slot.publish.contains(signer) || slot.revoke.contains(signer),
                        "schema {name} slot {i}: signer {signer} not in publish or revoke"
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_schema_name_returns_none() {
        assert!(named_schema("bogus").is_none());
    }

    #[test]
    fn slot_extends_past_table_length_for_plus_variants() {
        let table = normal();
        assert_eq!(table.slot(50), table.slots.last());
    }
}
