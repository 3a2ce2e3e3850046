//! Canonical wire-format serialization for DNSKEY RRsets and RRSIG signed
//! data, per RFC 4034 Section 3.1.8.1 and RFC 4035 Section 5.3.
//!
//! These are pure functions over the wire model: same inputs always
//! produce the same bytes, on any platform, which is the property the
//! whole ceremony's reproducibility rests on.

use crate::bundle::Bundle;
use crate::key::Key;
use crate::signature::Signature;

use crate::signature::RRTYPE_DNSKEY;

const CLASS_IN: u16 = 1;

/// Converts a presentation-format domain name into DNS wire format:
/// length-prefixed labels, lowercased, terminated by a zero-length root
/// label. `"."`, `""`, and a bare trailing dot all mean the root.
pub fn name_to_wire(name: &str) -> Vec<u8> {
    let trimmed = name.trim_end_matches('.');
    if trimmed.is_empty() {
        return vec![0];
    }

    let mut wire = Vec::with_capacity(trimmed.len() + 2);
    for label in trimmed.split('.') {
        let lower = label.to_ascii_lowercase();
        wire.push(lower.len() as u8);
        wire.extend_from_slice(lower.as_bytes());
    }
    wire.push(0);
    wire
}

/// One canonical DNSKEY resource record as it appears inside an RRset
/// being hashed for a signature: owner name, type, class, TTL, RDLENGTH,
/// RDATA.
fn canonical_rr(owner_wire: &[u8], ttl: u32, key: &Key) -> Vec<u8> {
    let rdata = key.canonical_rdata();
    let mut rr = Vec::with_capacity(owner_wire.len() + 10 + rdata.len());
    rr.extend_from_slice(owner_wire);
    rr.extend_from_slice(&RRTYPE_DNSKEY.to_be_bytes());
    rr.extend_from_slice(&CLASS_IN.to_be_bytes());
    rr.extend_from_slice(&ttl.to_be_bytes());
    rr.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    rr.extend_from_slice(&rdata);
    rr
}

/// The canonical DNSKEY RRset for `keys`, under `owner_name` and
/// `original_ttl`, sorted by canonical RDATA byte order as RFC 4034
/// Section 6.3 requires for signing.
pub fn canonical_dnskey_rrset(owner_name: &str, original_ttl: u32, keys: &[&Key]) -> Vec<u8> {
    let owner_wire = name_to_wire(owner_name);
    let mut sorted: Vec<&Key> = keys.to_vec();
    sorted.sort_by(|a, b| a.canonical_rdata().cmp(&b.canonical_rdata()));

    let mut rrset = Vec::new();
    for key in sorted {
        rrset.extend_from_slice(&canonical_rr(&owner_wire, original_ttl, key));
    }
    rrset
}

/// The exact byte string an RRSIG signature is computed over: the RRSIG
/// RDATA (minus the signature field) followed by the canonical RRset it
/// covers (RFC 4034 Section 3.1.8.1).
pub fn rrsig_signed_data(signature: &Signature, owner_name: &str, keys: &[&Key]) -> Vec<u8> {
    let mut data = signature.rdata_prefix();
    data.extend_from_slice(&canonical_dnskey_rrset(
        owner_name,
        signature.original_ttl,
        keys,
    ));
    data
}

/// Convenience wrapper: builds the signed-data bytes for `signature`
/// assuming it covers every key currently published in `bundle`.
pub fn bundle_signed_data(bundle: &Bundle, owner_name: &str, signature: &Signature) -> Vec<u8> {
    let keys: Vec<&Key> = bundle.keys.iter().collect();
    rrsig_signed_data(signature, owner_name, &keys)
}

/// SHA-256 DS digest of a DNSKEY, per RFC 4509: `SHA256(owner_wire ||
/// dnskey_rdata)`.
pub fn ds_sha256_digest(owner_name: &str, key: &Key) -> Vec<u8> {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(name_to_wire(owner_name));
    hasher.update(key.canonical_rdata());
    hasher.finalize().to_vec()
}
