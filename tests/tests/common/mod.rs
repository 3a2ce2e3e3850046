//! Shared fixture builders for the end-to-end ceremony flow tests.
//!
//! Every fixture here uses ECDSA P-256 throughout (both ZSK and KSK
//! material): `ring` can generate ECDSA keys but not RSA ones, so ECDSA is
//! the only algorithm a synthetic, self-contained fixture can use for a
//! real sign/verify round trip rather than a hand-constructed DER blob.

use std::path::Path;

use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};

use ksr_ceremony_application::{HandleKind, Signer};
use ksr_ceremony_domain::algorithm::ALG_ECDSA_P256_SHA256;
use ksr_ceremony_domain::canonical::{bundle_signed_data, ds_sha256_digest};
use ksr_ceremony_domain::key::{DNSKEY_PROTOCOL, FLAG_SEP, FLAG_ZONE_KEY};
use ksr_ceremony_domain::signature::RRTYPE_DNSKEY;
use ksr_ceremony_domain::{
    AlgorithmParams, AlgorithmPolicyEntry, Body, Bundle, CeremonyConfig, Document, IsoDuration,
    Key, KeyInventory, KskInventoryEntry, RequestPolicy, Signature, SignaturePolicy,
};
use ksr_ceremony_infrastructure::signer::write_pkcs8;
use ksr_ceremony_infrastructure::SoftHsmSigner;

pub const DOMAIN: &str = ".";

/// An in-memory ECDSA keypair standing in for the ZSK operator's own
/// signer, which this repository never touches through the `Signer`
/// port — only the KSK operator's HSM is a `Signer`.
pub struct ZskKeyPair {
    pub key: Key,
    keypair: EcdsaKeyPair,
}

impl ZskKeyPair {
    pub fn generate(identifier: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
        let keypair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng).unwrap();
        let point = keypair.public_key().as_ref().to_vec();
        let raw = point[1..].to_vec(); // drop the 0x04 uncompressed-point prefix

        let mut key = Key {
            key_identifier: identifier.to_string(),
            key_tag: 0,
            ttl: 172_800,
            flags: FLAG_ZONE_KEY,
            protocol: DNSKEY_PROTOCOL,
            algorithm: ALG_ECDSA_P256_SHA256,
            public_key: raw,
        };
        key.key_tag = key.compute_key_tag();

        Self { key, keypair }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        self.keypair.sign(&rng, message).unwrap().as_ref().to_vec()
    }
}

/// Builds one request bundle: a single ZSK, self-signed over its own
/// DNSKEY RRset, the way a ZSK operator submits a KSR bundle.
pub fn request_bundle(id: &str, inception: u32, expiration: u32, zsk: &ZskKeyPair) -> Bundle {
    let mut bundle = Bundle {
        id: id.to_string(),
        inception,
        expiration,
        keys: vec![zsk.key.clone()],
        signatures: Vec::new(),
        signer_hints: Vec::new(),
    };

    let draft = Signature {
        key_identifier: zsk.key.key_identifier.clone(),
        ttl: zsk.key.ttl,
        type_covered: RRTYPE_DNSKEY,
        algorithm: zsk.key.algorithm,
        labels: label_count(DOMAIN),
        original_ttl: zsk.key.ttl,
        signature_inception: inception,
        signature_expiration: expiration,
        key_tag: zsk.key.key_tag,
        signers_name: DOMAIN.to_string(),
        signature_data: Vec::new(),
    };
    let signed_data = bundle_signed_data(&bundle, DOMAIN, &draft);
    let signature_data = zsk.sign(&signed_data);
    bundle.signatures = vec![Signature { signature_data, ..draft }];
    bundle
}

fn label_count(owner_name: &str) -> u8 {
    let trimmed = owner_name.trim_end_matches('.');
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split('.').count() as u8
    }
}

/// Generates a fresh ECDSA KSK, writes it into the soft-HSM directory
/// under `label`, and returns the inventory entry describing it — key
/// tag and DS digest recomputed from the HSM's own reported public key,
/// the same way `inventory_reconciler` would.
pub fn mint_ksk(
    hsm_dir: &Path,
    identifier: &str,
    label: &str,
    valid_from: u32,
    valid_until: Option<u32>,
) -> KskInventoryEntry {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
    write_pkcs8(hsm_dir, label, pkcs8.as_ref()).unwrap();

    let signer = SoftHsmSigner::new(hsm_dir);
    let handles = signer.list(label).unwrap();
    let public_handle = handles.iter().find(|h| h.kind == HandleKind::Public).unwrap();
    let material = signer.public_key(public_handle).unwrap();

    let key = Key {
        key_identifier: identifier.to_string(),
        key_tag: 0,
        ttl: 172_800,
        flags: FLAG_ZONE_KEY | FLAG_SEP,
        protocol: DNSKEY_PROTOCOL,
        algorithm: material.algorithm,
        public_key: material.raw_bytes.clone(),
    };
    let key_tag = key.compute_key_tag();

    KskInventoryEntry {
        identifier: identifier.to_string(),
        description: format!("test fixture KSK {identifier}"),
        label: label.to_string(),
        key_tag,
        algorithm: material.algorithm,
        params: material.params,
        valid_from,
        valid_until,
        ds_sha256: ds_sha256_digest(DOMAIN, &key),
    }
}

fn ecdsa_signature_policy(min_validity_days: i64, max_validity_days: i64) -> SignaturePolicy {
    SignaturePolicy {
        publish_safety: IsoDuration::from_days(2),
        retire_safety: IsoDuration::from_days(2),
        max_signature_validity: IsoDuration::from_seconds(max_validity_days * 86_400),
        min_signature_validity: IsoDuration::from_seconds(min_validity_days * 86_400),
        max_validity_overlap: IsoDuration::from_days(11),
        min_validity_overlap: IsoDuration::from_days(9),
        algorithm_policy: vec![AlgorithmPolicyEntry {
            algorithm: ALG_ECDSA_P256_SHA256,
            params: AlgorithmParams::Ecdsa { size: 256 },
        }],
    }
}

/// A `CeremonyConfig` set up for ECDSA-only fixtures: `num_bundles` and
/// `num_keys_per_bundle` must describe the *response* bundles (ZSK plus
/// however many KSKs the chosen schema publishes per slot).
pub fn test_config(inventory: Vec<KskInventoryEntry>, num_keys_per_bundle: Vec<usize>) -> CeremonyConfig {
    let num_bundles = num_keys_per_bundle.len();
    let num_different_keys = 1 + inventory.len(); // one ZSK plus every distinct KSK
    CeremonyConfig {
        num_bundles,
        num_keys_per_bundle,
        num_different_keys_in_all_bundles: num_different_keys,
        acceptable_domains: vec![DOMAIN.to_string()],
        enable_unsupported_ecdsa: true,
        approved_algorithms: vec![ALG_ECDSA_P256_SHA256],
        ksk_policy: ecdsa_signature_policy(19, 21),
        inventory: KeyInventory { entries: inventory },
        ..CeremonyConfig::default()
    }
}

/// A minimal KSR: `num_bundles` bundles, each 20 days long and starting
/// 10 days after the previous one — the same cadence the root zone's own
/// ceremonies use, satisfying the default bundle-interval, cycle-length,
/// and overlap windows out of the box.
pub fn ksr_document(zsk: &ZskKeyPair, num_bundles: usize, start: u32) -> Document {
    let mut bundles = Vec::with_capacity(num_bundles);
    for i in 0..num_bundles {
        let inception = start + (i as u32) * 10 * 86_400;
        let expiration = inception + 20 * 86_400;
        bundles.push(request_bundle(&format!("bundle-{}", i + 1), inception, expiration, zsk));
    }
    Document {
        id: "ksr-test".to_string(),
        serial: 1,
        domain: DOMAIN.to_string(),
        timestamp: None,
        body: Body::Request {
            policy: RequestPolicy { zsk: ecdsa_signature_policy(7, 21) },
            bundles,
        },
    }
}
