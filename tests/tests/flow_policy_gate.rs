//! The policy gate is all-or-nothing: a rejected KSR must never reach the
//! HSM's signing operation. Observed with a spy signer that counts every
//! `sign` invocation on its way through to the real soft HSM.

mod common;

use std::cell::Cell;

use ksr_ceremony_application::ports::Codec;
use ksr_ceremony_application::{CeremonyInputs, KeyHandle, PublicKeyMaterial, Signer};
use ksr_ceremony_domain::CoreError;
use ksr_ceremony_infrastructure::{SoftHsmSigner, XmlCodec};

use common::{ksr_document, mint_ksk, test_config, ZskKeyPair};

struct SpySigner {
    inner: SoftHsmSigner,
    sign_calls: Cell<usize>,
}

impl SpySigner {
    fn new(inner: SoftHsmSigner) -> Self {
        Self { inner, sign_calls: Cell::new(0) }
    }
}

impl Signer for SpySigner {
    fn list(&self, label: &str) -> Result<Vec<KeyHandle>, CoreError> {
        self.inner.list(label)
    }

    fn public_key(&self, handle: &KeyHandle) -> Result<PublicKeyMaterial, CoreError> {
        self.inner.public_key(handle)
    }

    fn sign(&self, handle: &KeyHandle, algorithm: u8, message: &[u8]) -> Result<Vec<u8>, CoreError> {
        self.sign_calls.set(self.sign_calls.get() + 1);
        self.inner.sign(handle, algorithm, message)
    }
}

#[test]
fn a_rejected_ksr_triggers_zero_signing_calls() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let mut config = test_config(vec![ksk], vec![2; 9]);
    config.signature_horizon_days = 50; // well under the cycle's 100-day reach

    let zsk = ZskKeyPair::generate("zsk-1");
    let ksr = ksr_document(&zsk, 9, now);
    let codec = XmlCodec;
    let signer = SpySigner::new(SoftHsmSigner::new(hsm_dir.path()));
    let ksr_xml = codec.encode(&ksr).unwrap();

    let result = ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr_xml, previous_skr_xml: None, config: &config, schema_name: "normal", now },
        &codec,
        &signer,
    );

    assert!(matches!(result, Err(CoreError::PolicyViolation(_))));
    assert_eq!(signer.sign_calls.get(), 0);
}

#[test]
fn an_accepted_ksr_signs_once_per_bundle() {
    let hsm_dir = tempfile::tempdir().unwrap();
    let now = 1_700_000_000;

    let ksk = mint_ksk(hsm_dir.path(), "ksk_current", "ksk-current-2026", now - 86_400, None);
    let config = test_config(vec![ksk], vec![2; 9]);

    let zsk = ZskKeyPair::generate("zsk-1");
    let ksr = ksr_document(&zsk, 9, now);
    let codec = XmlCodec;
    let signer = SpySigner::new(SoftHsmSigner::new(hsm_dir.path()));
    let ksr_xml = codec.encode(&ksr).unwrap();

    ksr_ceremony_application::run_ceremony(
        CeremonyInputs { ksr_xml: &ksr_xml, previous_skr_xml: None, config: &config, schema_name: "normal", now },
        &codec,
        &signer,
    )
    .unwrap();

    assert_eq!(signer.sign_calls.get(), 9);
}
