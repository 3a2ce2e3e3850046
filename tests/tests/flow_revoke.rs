//! `revoke`: the outgoing KSK is published with the REVOKE bit set while
//! it still co-signs the transition, then drops out of the RRset by the
//! final slot.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_domain::key::FLAG_REVOKE;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn revoke_schema_publishes_the_outgoing_ksk_with_the_revoke_bit_set() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let current = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let next = mint_ksk(hsm_dir.path(), "ksk_next", "ksk-next-2027", now - 86_400, None);
    let zsk = ZskKeyPair::generate("zsk-1");

    let num_keys_per_bundle = vec![3, 3, 3, 3, 3, 3, 3, 3, 2];
    let config = test_config(vec![current, next], num_keys_per_bundle);
    let ksr = ksr_document(&zsk, 9, now);

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());
    let ksr_xml = codec.encode(&ksr).unwrap();

    let inputs = CeremonyInputs {
        ksr_xml: &ksr_xml,
        previous_skr_xml: None,
        config: &config,
        schema_name: "revoke",
        now,
    };

    let skr_xml = ksr_ceremony_application::run_ceremony(inputs, &codec, &signer).unwrap();
    let skr = codec.decode(&skr_xml).unwrap();

    let bundles = skr.bundles();

    // First slot: both published, neither revoked yet.
    let first_current = bundles[0].keys.iter().find(|k| k.key_identifier == "ksk_current").unwrap();
    assert_eq!(first_current.flags & FLAG_REVOKE, 0);

    // A middle slot: ksk_current carries the REVOKE bit but still co-signs.
    let middle = &bundles[4];
    let middle_current = middle.keys.iter().find(|k| k.key_identifier == "ksk_current").unwrap();
    assert_ne!(middle_current.flags & FLAG_REVOKE, 0);
    let middle_signers: Vec<&str> = middle.signatures.iter().map(|s| s.key_identifier.as_str()).collect();
    assert!(middle_signers.contains(&"ksk_current"));
    assert!(middle_signers.contains(&"ksk_next"));

    // Last slot: ksk_current has dropped out entirely.
    let last = bundles.last().unwrap();
    assert!(!last.keys.iter().any(|k| k.key_identifier == "ksk_current"));
    assert!(last.keys.iter().any(|k| k.key_identifier == "ksk_next"));

    ksr_ceremony_application::use_cases::verify_skr::verify(&skr, &config, None, now).unwrap();
}
