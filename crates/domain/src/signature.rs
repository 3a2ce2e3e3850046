use serde::{Deserialize, Serialize};

/// RRSIG type covered; DNSKEY-RRset signatures always cover type 48.
pub const RRTYPE_DNSKEY: u16 = 48;

/// A DNSKEY RRSIG as it appears in a KSR/SKR bundle.
///
/// `key_identifier` must resolve to a [`crate::key::Key`] within the same
/// bundle, and that key's `algorithm`/`key_tag` must agree with this
/// record's (checked by the policy engine, not by this type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub key_identifier: String,
    pub ttl: u32,
    pub type_covered: u16,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub signature_inception: u32,
    pub signature_expiration: u32,
    pub key_tag: u16,
    pub signers_name: String,
    pub signature_data: Vec<u8>,
}

impl Signature {
    /// RRSIG RDATA up to but excluding the signature itself, in canonical
    /// wire form (RFC 4034 Section 3.1, minus the trailing signature
    /// field): used both as the prefix of the signed data and for
    /// emission.
    pub fn rdata_prefix(&self) -> Vec<u8> {
        let mut rdata = Vec::with_capacity(18 + self.signers_name.len() + 2);
        rdata.extend_from_slice(&self.type_covered.to_be_bytes());
        rdata.push(self.algorithm);
        rdata.push(self.labels);
        rdata.extend_from_slice(&self.original_ttl.to_be_bytes());
        rdata.extend_from_slice(&self.signature_expiration.to_be_bytes());
        rdata.extend_from_slice(&self.signature_inception.to_be_bytes());
        rdata.extend_from_slice(&self.key_tag.to_be_bytes());
        rdata.extend_from_slice(&crate::canonical::name_to_wire(&self.signers_name));
        rdata
    }

    pub fn validity_seconds(&self) -> i64 {
        i64::from(self.signature_expiration) - i64::from(self.signature_inception)
    }
}
