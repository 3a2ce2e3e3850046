//! A KSR whose final bundle signs further out than the configured
//! horizon must be rejected before any HSM call happens.

mod common;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_domain::CoreError;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

#[test]
fn a_bundle_expiring_past_the_horizon_is_rejected() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let mut config = test_config(vec![ksk], vec![2; 9]);
    // The cycle's last bundle expires 100 days out; tighten the horizon
    // well below that so only the horizon check can fail.
    config.signature_horizon_days = 50;

    let zsk = ZskKeyPair::generate("zsk-1");
    let ksr = ksr_document(&zsk, 9, now);
    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());
    let ksr_xml = codec.encode(&ksr).unwrap();

    let result = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr_xml, previous_skr_xml: None, config: &config, schema_name: "normal", now },
        &codec,
        &signer,
    );

    match result {
        Err(CoreError::PolicyViolation(violations)) => {
            assert!(violations.iter().any(|v| v.check_name == "SignatureExpireHorizon"));
        }
        other => panic!("expected a SignatureExpireHorizon policy violation, got {other:?}"),
    }
}

#[test]
fn the_same_cycle_passes_once_the_horizon_is_widened() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let mut config = test_config(vec![ksk], vec![2; 9]);
    config.signature_horizon_days = 365;

    let zsk = ZskKeyPair::generate("zsk-1");
    let ksr = ksr_document(&zsk, 9, now);
    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir.path());
    let ksr_xml = codec.encode(&ksr).unwrap();

    let result = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr_xml, previous_skr_xml: None, config: &config, schema_name: "normal", now },
        &codec,
        &signer,
    );

    assert!(result.is_ok());
}
