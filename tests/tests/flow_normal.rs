//! The plain `normal` schema: one KSK publishes and signs every slot,
//! end to end from a freshly minted KSR through a verifiable SKR.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn normal_schema_produces_a_verifiable_nine_bundle_skr() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let zsk = ZskKeyPair::generate("zsk-1");

    let config = test_config(vec![ksk], vec![2; 9]);
    let ksr = ksr_document(&zsk, 9, now);

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());
    let ksr_xml = codec.encode(&ksr).unwrap();

    let inputs = CeremonyInputs {
        ksr_xml: &ksr_xml,
        previous_skr_xml: None,
        config: &config,
        schema_name: "normal",
        now,
    };

    let skr_xml = ksr_ceremony_application::run_ceremony(inputs, &codec, &signer).unwrap();
    let skr = codec.decode(&skr_xml).unwrap();

    assert!(skr.body.is_response());
    assert_eq!(skr.bundles().len(), 9);
    for bundle in skr.bundles() {
        // the ZSK plus ksk_current, with exactly one KSK-made RRSIG — the
        // ZSK's own request signature is not carried into the response
        assert_eq!(bundle.keys.len(), 2);
        assert_eq!(bundle.signatures.len(), 1);
        assert_eq!(bundle.signatures[0].key_identifier, "ksk_current");
    }

    // Re-running the full policy engine over the emitted SKR (what a
    // downstream verifier would do) must also accept it.
    ksr_ceremony_application::use_cases::verify_skr::verify(&skr, &config, None, now).unwrap();
}
