//! `rollover`: both KSKs stay published throughout, but signing
//! authority moves from the outgoing KSK to the incoming one after the
//! first slot.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn rollover_schema_moves_signing_authority_after_slot_one() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let current = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let next = mint_ksk(hsm_dir.path(), "ksk_next", "ksk-next-2027", now - 86_400, None);
    let zsk = ZskKeyPair::generate("zsk-1");

    let config = test_config(vec![current, next], vec![3; 9]);
    let ksr = ksr_document(&zsk, 9, now);

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());
    let ksr_xml = codec.encode(&ksr).unwrap();

    let inputs = CeremonyInputs {
        ksr_xml: &ksr_xml,
        previous_skr_xml: None,
        config: &config,
        schema_name: "rollover",
        now,
    };

    let skr_xml = ksr_ceremony_application::run_ceremony(inputs, &codec, &signer).unwrap();
    let skr = codec.decode(&skr_xml).unwrap();

    let bundles = skr.bundles();
    for bundle in bundles {
        assert_eq!(bundle.keys.len(), 3);
        assert!(bundle.keys.iter().any(|k| k.key_identifier == "ksk_current"));
        assert!(bundle.keys.iter().any(|k| k.key_identifier == "ksk_next"));
    }

    let first_signers: Vec<&str> = bundles[0].signatures.iter().map(|s| s.key_identifier.as_str()).collect();
    assert!(first_signers.contains(&"ksk_current"));
    assert!(!first_signers.contains(&"ksk_next"));

    for bundle in &bundles[1..] {
        let signers: Vec<&str> = bundle.signatures.iter().map(|s| s.key_identifier.as_str()).collect();
        assert!(signers.contains(&"ksk_next"));
        assert!(!signers.contains(&"ksk_current"));
    }

    ksr_ceremony_application::use_cases::verify_skr::verify(&skr, &config, None, now).unwrap();
}
