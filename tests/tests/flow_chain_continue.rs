//! Two consecutive ceremonies under the same ZSK: the second cycle's KSR
//! continues the first SKR's last bundle, so chain linkage must accept it
//! and the produced SKR must itself verify.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn a_continuous_zsk_chains_cleanly_across_two_ceremonies() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let start = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", start - 86_400, None);
    let config = test_config(vec![ksk], vec![2; 9]);

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());

    let zsk = ZskKeyPair::generate("zsk-1");
    let ksr1 = ksr_document(&zsk, 9, start);
    let ksr1_xml = codec.encode(&ksr1).unwrap();
    let skr1_xml = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr1_xml, previous_skr_xml: None, config: &config, schema_name: "normal", now: start },
        &codec,
        &signer,
    )
    .unwrap();
    let skr1 = codec.decode(&skr1_xml).unwrap();
    let prev_last = skr1.last_bundle().unwrap();

    // Next cycle starts so its first bundle overlaps the previous last
    // bundle by 10 days, inside the [9, 11]-day policy window.
    let start2 = prev_last.expiration - 10 * 86_400;
    let mut ksr2 = ksr_document(&zsk, 9, start2);
    ksr2.serial = 2;
    let ksr2_xml = codec.encode(&ksr2).unwrap();

    let skr2_xml = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr2_xml, previous_skr_xml: Some(&skr1_xml), config: &config, schema_name: "normal", now: start2 },
        &codec,
        &signer,
    )
    .unwrap();
    let skr2 = codec.decode(&skr2_xml).unwrap();

    // Every ZSK the previous SKR's last bundle carried survives, byte for
    // byte, into the new SKR's first bundle.
    let first = skr2.first_bundle().unwrap();
    for prev_key in prev_last.keys.iter().filter(|k| !k.is_ksk()) {
        assert!(first.keys.iter().any(|k| k.public_key == prev_key.public_key));
    }
    assert!(first.inception < prev_last.expiration);

    ksr_ceremony_application::use_cases::verify_skr::verify(&skr2, &config, Some(&skr1), start2).unwrap();
}
