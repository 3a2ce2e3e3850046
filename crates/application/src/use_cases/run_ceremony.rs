//! The ceremony orchestrator: parse, check, sign, check again, emit.
//!
//! This is the one stateful actor in the whole core — it is the only
//! module that calls into the [`Signer`] — and it follows the component
//! design's procedure exactly: every policy gate runs to completion
//! before any call that could touch the HSM, and a mid-ceremony signing
//! failure discards the partial response rather than emitting it.

use ksr_ceremony_domain::canonical::bundle_signed_data;
use ksr_ceremony_domain::key::{DNSKEY_PROTOCOL, FLAG_REVOKE, FLAG_SEP, FLAG_ZONE_KEY};
use ksr_ceremony_domain::signature::RRTYPE_DNSKEY;
use ksr_ceremony_domain::{Body, Bundle, CeremonyConfig, CoreError, Document, Key, ResponsePolicy, Signature};

use crate::inventory_reconciler;
use crate::policy::{PolicyContext, PolicyEngine};
use crate::ports::{Codec, HandleKind, Signer};
use crate::schema_engine::SchemaEngine;

use super::verify_skr;

/// Everything `run_ceremony` needs beyond its injected `Codec`/`Signer`.
pub struct CeremonyInputs<'a> {
    pub ksr_xml: &'a [u8],
    pub previous_skr_xml: Option<&'a [u8]>,
    pub config: &'a CeremonyConfig,
    pub schema_name: &'a str,
    pub now: u32,
}

/// Runs one full ceremony and returns the encoded SKR bytes.
pub fn run_ceremony(
    inputs: CeremonyInputs,
    codec: &dyn Codec,
    signer: &dyn Signer,
) -> Result<Vec<u8>, CoreError> {
    inputs.config.validate()?;

    let previous = inputs
        .previous_skr_xml
        .map(|xml| codec.decode(xml))
        .transpose()?;
    if let Some(previous) = &previous {
        tracing::debug!(ksr_id = %previous.id, "verifying previous SKR before chain linkage");
        verify_skr::verify(previous, inputs.config, None, inputs.now)?;
    }

    let ksr = codec.decode(inputs.ksr_xml)?;
    tracing::info!(ksr_id = %ksr.id, serial = ksr.serial, "parsed KSR");

    if let Some(previous) = &previous {
        if ksr.serial <= previous.serial {
            return Err(CoreError::ChainLinkageFailed(format!(
                "KSR serial {} does not advance past the previous SKR's serial {}",
                ksr.serial, previous.serial
            )));
        }
    }

    let request_engine = PolicyEngine::from_config(inputs.config);
    let request_ctx = PolicyContext::new(&ksr, inputs.config, previous.as_ref(), inputs.now);
    request_engine.evaluate(&request_ctx).map_err(promote_chain_failure)?;
    tracing::info!("request-policy checks passed");

    inventory_reconciler::reconcile(&inputs.config.inventory, signer, &ksr.domain, inputs.now)?;
    tracing::info!("HSM inventory reconciled");

    let schema_engine = SchemaEngine::load(inputs.schema_name, &inputs.config.inventory)?;

    let request_bundles = ksr.bundles();
    let mut response_bundles = Vec::with_capacity(request_bundles.len());
    for (index, request_bundle) in request_bundles.iter().enumerate() {
        let slot_number = index + 1;
        let slot = schema_engine.resolve(slot_number, inputs.now)?;
        let bundle =
            build_response_bundle(request_bundle, &ksr.domain, &slot, inputs.config.dns_ttl, signer)?;
        tracing::debug!(bundle_id = %bundle.id, slot = slot_number, "built response bundle");
        response_bundles.push(bundle);
    }

    let response = Document {
        id: ksr.id.clone(),
        serial: ksr.serial,
        domain: ksr.domain.clone(),
        timestamp: Some(inputs.now),
        body: Body::Response {
            policy: response_policy(&ksr, inputs.config),
            bundles: response_bundles,
        },
    };

    let response_engine = PolicyEngine::from_config(inputs.config);
    let response_ctx = PolicyContext::new(&response, inputs.config, previous.as_ref(), inputs.now);
    response_engine.evaluate(&response_ctx)?;
    tracing::info!("response-policy checks passed");

    let encoded = codec.encode(&response)?;
    tracing::info!(ksr_id = %response.id, "emitted SKR");
    Ok(encoded)
}

/// A rejected request whose violations include a chain-linkage check is a
/// broken chain, not just a malformed cycle: the new KSR fails to continue
/// the trust the previous SKR established, and that failure gets its own
/// error kind.
fn promote_chain_failure(err: CoreError) -> CoreError {
    match err {
        CoreError::PolicyViolation(violations) => {
            let chain: Vec<String> = violations
                .iter()
                .filter(|v| matches!(v.check_name, "CheckChainKeys" | "CheckChainOverlap"))
                .map(|v| v.to_string())
                .collect();
            if chain.is_empty() {
                CoreError::PolicyViolation(violations)
            } else {
                CoreError::ChainLinkageFailed(chain.join("; "))
            }
        }
        other => other,
    }
}

fn response_policy(ksr: &Document, config: &CeremonyConfig) -> ResponsePolicy {
    let zsk = match &ksr.body {
        Body::Request { policy, .. } => policy.zsk.clone(),
        Body::Response { policy, .. } => policy.zsk.clone(),
    };
    ResponsePolicy {
        ksk: config.ksk_policy.clone(),
        zsk,
    }
}

fn build_response_bundle(
    request_bundle: &Bundle,
    owner_name: &str,
    slot: &crate::schema_engine::ResolvedSlot<'_>,
    dns_ttl: u32,
    signer: &dyn Signer,
) -> Result<Bundle, CoreError> {
    let mut keys = request_bundle.keys.clone();

    // dns_ttl of 0 means "inherit the TTL the ZSK operator declared";
    // anything else overrides the TTL on the KSK records this ceremony adds.
    let ksk_ttl = if dns_ttl != 0 {
        dns_ttl
    } else {
        request_bundle.keys.first().map(|k| k.ttl).unwrap_or(172_800)
    };

    // A revoked KSK is still published in this slot's DNSKEY RRset, just
    // with the REVOKE bit set instead of (or alongside) plain publication
    // — so the set of keys to emit is publish ∪ revoke, not publish alone.
    let mut published = slot.publish.clone();
    for entry in slot.revoke.iter().copied() {
        if !published.iter().any(|p| p.identifier == entry.identifier) {
            published.push(entry);
        }
    }

    for entry in &published {
        let handles = signer.list(&entry.label)?;
        let public_handle = handles
            .iter()
            .find(|h| h.kind == HandleKind::Public)
            .ok_or_else(|| CoreError::InventoryMismatch {
                identifier: entry.identifier.clone(),
                reason: format!("no public key handle registered under label {:?}", entry.label),
            })?;
        let material = signer.public_key(public_handle)?;
        let revoked = slot.revoke.iter().any(|r| r.identifier == entry.identifier);

        // Setting the REVOKE bit changes the RDATA and therefore the key
        // tag (RFC 5011), so the emitted tag is recomputed from the emitted
        // record; reconciliation already proved the unrevoked form matches
        // the inventory's declared tag.
        let mut key = Key {
            key_identifier: entry.identifier.clone(),
            key_tag: 0,
            ttl: ksk_ttl,
            flags: FLAG_ZONE_KEY | FLAG_SEP | if revoked { FLAG_REVOKE } else { 0 },
            protocol: DNSKEY_PROTOCOL,
            algorithm: material.algorithm,
            public_key: material.raw_bytes,
        };
        key.key_tag = key.compute_key_tag();
        keys.push(key);
    }

    keys.sort_by(|a, b| a.canonical_rdata().cmp(&b.canonical_rdata()));

    let mut bundle = Bundle {
        id: request_bundle.id.clone(),
        inception: request_bundle.inception,
        expiration: request_bundle.expiration,
        keys,
        signatures: Vec::new(),
        signer_hints: Vec::new(),
    };

    let mut signatures = Vec::new();
    for entry in slot.sign.iter() {
        let key = bundle
            .key_by_identifier(&entry.identifier)
            .ok_or_else(|| CoreError::ConfigurationError(format!(
                "schema signs with {:?}, which was never published in this slot",
                entry.identifier
            )))?;

        let draft = Signature {
            key_identifier: entry.identifier.clone(),
            ttl: key.ttl,
            type_covered: RRTYPE_DNSKEY,
            algorithm: key.algorithm,
            labels: label_count(owner_name),
            original_ttl: key.ttl,
            signature_inception: bundle.inception,
            signature_expiration: bundle.expiration,
            key_tag: key.key_tag,
            signers_name: owner_name.to_string(),
            signature_data: Vec::new(),
        };

        let signed_data = bundle_signed_data(&bundle, owner_name, &draft);

        let handles = signer.list(&entry.label)?;
        let private_handle = handles
            .iter()
            .find(|h| h.kind == HandleKind::Private)
            .ok_or_else(|| CoreError::SigningFailed {
                identifier: entry.identifier.clone(),
                algorithm: key.algorithm,
                reason: format!("no private key handle registered under label {:?}", entry.label),
            })?;
        let signature_data = signer.sign(private_handle, key.algorithm, &signed_data)?;

        signatures.push(Signature {
            signature_data,
            ..draft
        });
    }

    signatures.sort_by_key(|s| (s.key_tag, s.algorithm));
    bundle.signatures = signatures;
    Ok(bundle)
}

fn label_count(owner_name: &str) -> u8 {
    let trimmed = owner_name.trim_end_matches('.');
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split('.').count() as u8
    }
}
