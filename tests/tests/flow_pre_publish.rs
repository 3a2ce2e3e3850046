//! `pre-publish`: the incoming KSK is published from slot 2 onward but
//! never signs — it rides along in the RRset so validators cache it
//! ahead of the rollover that follows in a later cycle.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn pre_publish_schema_introduces_the_next_ksk_from_slot_two() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let current = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let next = mint_ksk(hsm_dir.path(), "ksk_next", "ksk-next-2027", now - 86_400, None);
    let zsk = ZskKeyPair::generate("zsk-1");

    let num_keys_per_bundle = vec![2, 3, 3, 3, 3, 3, 3, 3, 3];
    let config = test_config(vec![current, next], num_keys_per_bundle);
    let ksr = ksr_document(&zsk, 9, now);

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());
    let ksr_xml = codec.encode(&ksr).unwrap();

    let inputs = CeremonyInputs {
        ksr_xml: &ksr_xml,
        previous_skr_xml: None,
        config: &config,
        schema_name: "pre-publish",
        now,
    };

    let skr_xml = ksr_ceremony_application::run_ceremony(inputs, &codec, &signer).unwrap();
    let skr = codec.decode(&skr_xml).unwrap();

    let bundles = skr.bundles();
    assert_eq!(bundles[0].keys.len(), 2);
    assert_eq!(bundles[0].signatures.len(), 1);
    assert!(bundles[0].keys.iter().any(|k| k.key_identifier == "ksk_current"));
    assert!(!bundles[0].keys.iter().any(|k| k.key_identifier == "ksk_next"));

    for bundle in &bundles[1..] {
        assert_eq!(bundle.keys.len(), 3);
        assert_eq!(bundle.signatures.len(), 1);
        assert!(bundle.keys.iter().any(|k| k.key_identifier == "ksk_next"));
        // pre-published but not yet signing
        assert!(bundle.signatures.iter().all(|s| s.key_identifier != "ksk_next"));
    }

    ksr_ceremony_application::use_cases::verify_skr::verify(&skr, &config, None, now).unwrap();
}
