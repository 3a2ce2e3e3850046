use serde::{Deserialize, Serialize};

/// DNSKEY protocol field; RFC 4034 fixes this at 3 for all DNSSEC keys.
pub const DNSKEY_PROTOCOL: u8 = 3;

/// Zone Key flag (bit 7, value 0x0100): must be set on every DNSKEY.
pub const FLAG_ZONE_KEY: u16 = 0x0100;

/// Secure Entry Point flag (bit 15, value 0x0001): set on KSKs.
pub const FLAG_SEP: u16 = 0x0001;

/// REVOKE flag (bit 8, value 0x0080): announces that the key's holder has
/// revoked it, per RFC 5011.
pub const FLAG_REVOKE: u16 = 0x0080;

/// A DNSKEY record as it appears in a KSR/SKR bundle.
///
/// `key_identifier` is a document-scoped label chosen by whichever party
/// introduced the key (arbitrary string, not part of the DNS wire format);
/// `key_tag` is the wire-format RFC 4034 Appendix B checksum and must equal
/// [`Key::compute_key_tag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub key_identifier: String,
    pub key_tag: u16,
    pub ttl: u32,
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl Key {
    /// Canonical DNSKEY RDATA: `flags(2) || protocol(1) || algorithm(1) ||
    /// public_key(var)`, network byte order (RFC 4034 Section 2).
    pub fn canonical_rdata(&self) -> Vec<u8> {
        let mut rdata = Vec::with_capacity(4 + self.public_key.len());
        rdata.extend_from_slice(&self.flags.to_be_bytes());
        rdata.push(self.protocol);
        rdata.push(self.algorithm);
        rdata.extend_from_slice(&self.public_key);
        rdata
    }

    /// RFC 4034 Appendix B key tag algorithm. Algorithm 1 (RSA/MD5) uses a
    /// special case reading the low-order 16 bits of the modulus; every
    /// other algorithm uses the generic 16-bit one's-complement checksum
    /// over the RDATA.
    pub fn compute_key_tag(&self) -> u16 {
        if self.algorithm == 1 {
            return self.compute_key_tag_algorithm_1();
        }

        let rdata = self.canonical_rdata();
        let mut accumulator: u32 = 0;
        for (i, byte) in rdata.iter().enumerate() {
            if i % 2 == 0 {
                accumulator += u32::from(*byte) << 8;
            } else {
                accumulator += u32::from(*byte);
            }
        }
        accumulator += (accumulator >> 16) & 0xFFFF;
        (accumulator & 0xFFFF) as u16
    }

    fn compute_key_tag_algorithm_1(&self) -> u16 {
        let len = self.public_key.len();
        if len < 3 {
            return 0;
        }
        u16::from_be_bytes([self.public_key[len - 3], self.public_key[len - 2]])
    }

    pub fn is_ksk(&self) -> bool {
        self.flags & FLAG_SEP != 0
    }

    pub fn is_revoked(&self) -> bool {
        self.flags & FLAG_REVOKE != 0
    }

    pub fn with_revoke_flag(mut self, revoked: bool) -> Self {
        if revoked {
            self.flags |= FLAG_REVOKE;
        } else {
            self.flags &= !FLAG_REVOKE;
        }
        self
    }
}
