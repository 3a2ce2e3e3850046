//! A second ceremony whose KSR swaps in an unrelated ZSK instead of
//! continuing the one the previous SKR's last bundle carried: chain
//! linkage must reject it even though every other policy window lines up.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_domain::CoreError;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn a_discontinuous_zsk_fails_chain_linkage_against_the_previous_skr() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let start = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", start - 86_400, None);
    let config = test_config(vec![ksk], vec![2; 9]);

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());

    let zsk1 = ZskKeyPair::generate("zsk-1");
    let ksr1 = ksr_document(&zsk1, 9, start);
    let ksr1_xml = codec.encode(&ksr1).unwrap();
    let skr1_xml = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr1_xml, previous_skr_xml: None, config: &config, schema_name: "normal", now: start },
        &codec,
        &signer,
    )
    .unwrap();
    let skr1 = codec.decode(&skr1_xml).unwrap();
    let last_expiration = skr1.last_bundle().unwrap().expiration;

    // Overlaps skr1's last bundle by 10 days in time, but under a
    // completely different ZSK — the ZSK chain is what must break here.
    let zsk2 = ZskKeyPair::generate("zsk-2");
    let start2 = last_expiration - 10 * 86_400;
    let mut ksr2 = ksr_document(&zsk2, 9, start2);
    ksr2.serial = 2;
    let ksr2_xml = codec.encode(&ksr2).unwrap();

    let now2 = start2;
    let result = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr2_xml, previous_skr_xml: Some(&skr1_xml), config: &config, schema_name: "normal", now: now2 },
        &codec,
        &signer,
    );

    match result {
        Err(CoreError::ChainLinkageFailed(message)) => {
            assert!(message.contains("CheckChainKeys"), "unexpected message: {message}");
        }
        other => panic!("expected ChainLinkageFailed, got {other:?}"),
    }
}

#[test]
fn a_stale_serial_fails_chain_linkage_before_any_policy_check() {
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
    let start2 = skr1.last_bundle().unwrap().expiration - 10 * 86_400;

    // Same ZSK, perfectly overlapping windows — but the serial never moved.
    let ksr2 = ksr_document(&zsk, 9, start2);
    assert_eq!(ksr2.serial, skr1.serial);
    let ksr2_xml = codec.encode(&ksr2).unwrap();

    let result = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr2_xml, previous_skr_xml: Some(&skr1_xml), config: &config, schema_name: "normal", now: start2 },
        &codec,
        &signer,
    );

    match result {
        Err(CoreError::ChainLinkageFailed(message)) => {
            assert!(message.contains("serial"), "unexpected message: {message}");
        }
        other => panic!("expected ChainLinkageFailed, got {other:?}"),
    }
}
