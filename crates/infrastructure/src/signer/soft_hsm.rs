//! File-backed `Signer`, good for development, CI, and ceremony rehearsal
//! — not a production key-custody design. One PKCS#8 DER file per label,
//! named `<label>.pk8`, in an operator-supplied directory. Never logs key
//! material.
//!
//! RSA signing uses `RSA_PKCS1_SHA256` via `ring::signature::RsaKeyPair`;
//! ECDSA P-256 signing uses `ECDSA_P256_SHA256_FIXED_SIGNING`, producing
//! the raw `r || s` encoding the policy engine's verifier
//! (`ECDSA_P256_SHA256_FIXED`) and RFC 6605 both expect, rather than the
//! ASN.1 DER encoding a general-purpose ECDSA verifier would expect.

use std::path::{Path, PathBuf};

use ring::rand::SystemRandom;
use ring::signature;
use ring::signature::KeyPair;

use ksr_ceremony_application::{HandleKind, KeyHandle, PublicKeyMaterial, Signer};
use ksr_ceremony_domain::algorithm::{ALG_ECDSA_P256_SHA256, ALG_RSA_SHA256};
use ksr_ceremony_domain::{AlgorithmParams, CoreError};

pub struct SoftHsmSigner {
    directory: PathBuf,
    rng: SystemRandom,
}

impl SoftHsmSigner {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into(), rng: SystemRandom::new() }
    }

    fn key_path(&self, label: &str) -> PathBuf {
        self.directory.join(format!("{label}.pk8"))
    }

    fn load_pkcs8(&self, label: &str) -> Result<Vec<u8>, CoreError> {
        std::fs::read(self.key_path(label))
            .map_err(|e| CoreError::HsmUnavailable(format!("no key material for label {label:?}: {e}")))
    }
}

impl Signer for SoftHsmSigner {
    fn list(&self, label: &str) -> Result<Vec<KeyHandle>, CoreError> {
        if self.key_path(label).is_file() {
            Ok(vec![
                KeyHandle { label: label.to_string(), kind: HandleKind::Public },
                KeyHandle { label: label.to_string(), kind: HandleKind::Private },
            ])
        } else {
            Ok(vec![])
        }
    }

    fn public_key(&self, handle: &KeyHandle) -> Result<PublicKeyMaterial, CoreError> {
        let der = self.load_pkcs8(&handle.label)?;

        if let Ok(rsa) = signature::RsaKeyPair::from_pkcs8(&der) {
            let spki = rsa.public_key().as_ref();
            let (modulus, exponent) = parse_rsa_public_key_der(spki)?;
            let size = rsa_modulus_bits(&modulus);
            let exponent_value = bytes_to_u64(&exponent, &handle.label)?;
            let raw_bytes = encode_rsa_public_key_wire(&modulus, &exponent);
            return Ok(PublicKeyMaterial {
                algorithm: ALG_RSA_SHA256,
                params: AlgorithmParams::Rsa { size, exponent: exponent_value },
                raw_bytes,
            });
        }

        if let Ok(ec) = signature::EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, &der, &self.rng) {
            let point = ec.public_key().as_ref();
            if point.len() != 65 || point[0] != 0x04 {
                return Err(CoreError::HsmUnavailable(format!(
                    "unexpected EC public key encoding for label {:?}",
                    handle.label
                )));
            }
            return Ok(PublicKeyMaterial {
                algorithm: ALG_ECDSA_P256_SHA256,
                params: AlgorithmParams::Ecdsa { size: 256 },
                raw_bytes: point[1..].to_vec(),
            });
        }

        Err(CoreError::HsmUnavailable(format!(
            "key material for label {:?} is neither a valid RSA nor ECDSA PKCS#8 document",
            handle.label
        )))
    }

    fn sign(&self, handle: &KeyHandle, algorithm: u8, message: &[u8]) -> Result<Vec<u8>, CoreError> {
        if handle.kind != HandleKind::Private {
            return Err(CoreError::SigningFailed {
                identifier: handle.label.clone(),
                algorithm,
                reason: "handle does not reference a private key".into(),
            });
        }
        let der = self.load_pkcs8(&handle.label)?;

        match algorithm {
            ALG_RSA_SHA256 => {
                let key_pair = signature::RsaKeyPair::from_pkcs8(&der).map_err(|e| signing_failed(handle, algorithm, e))?;
                let mut sig = vec![0u8; key_pair.public().modulus_len()];
                key_pair
                    .sign(&signature::RSA_PKCS1_SHA256, &self.rng, message, &mut sig)
                    .map_err(|e| signing_failed(handle, algorithm, e))?;
                Ok(sig)
            }
            ALG_ECDSA_P256_SHA256 => {
                let key_pair = signature::EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, &der, &self.rng)
                    .map_err(|e| signing_failed(handle, algorithm, e))?;
                let sig = key_pair.sign(&self.rng, message).map_err(|e| signing_failed(handle, algorithm, e))?;
                Ok(sig.as_ref().to_vec())
            }
            other => Err(CoreError::SigningFailed {
                identifier: handle.label.clone(),
                algorithm: other,
                reason: "unsupported algorithm".into(),
            }),
        }
    }
}

fn signing_failed(handle: &KeyHandle, algorithm: u8, error: impl std::fmt::Display) -> CoreError {
    CoreError::SigningFailed { identifier: handle.label.clone(), algorithm, reason: error.to_string() }
}

/// Bit length of a positive big-endian integer with its sign-padding byte
/// already stripped: properly generated RSA moduli always carry a set top
/// bit, so this is exact for every key this signer produces.
fn rsa_modulus_bits(modulus: &[u8]) -> u32 {
    match modulus.first() {
        Some(&first) => modulus.len() as u32 * 8 - first.leading_zeros(),
        None => 0,
    }
}

fn bytes_to_u64(bytes: &[u8], label: &str) -> Result<u64, CoreError> {
    if bytes.len() > 8 {
        return Err(CoreError::HsmUnavailable(format!("RSA exponent for label {label:?} does not fit in 64 bits")));
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(u64::from_be_bytes(buf))
}

/// RFC 3110 wire encoding: exponent-length prefix (one byte, or zero
/// followed by a big-endian `u16` when the exponent is 256 bytes or
/// longer), the exponent, then the modulus.
fn encode_rsa_public_key_wire(modulus: &[u8], exponent: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(4 + exponent.len() + modulus.len());
    if exponent.len() < 256 {
        wire.push(exponent.len() as u8);
    } else {
        wire.push(0);
        wire.extend_from_slice(&(exponent.len() as u16).to_be_bytes());
    }
    wire.extend_from_slice(exponent);
    wire.extend_from_slice(modulus);
    wire
}

/// Reads the `SEQUENCE { INTEGER modulus, INTEGER publicExponent }` that
/// `ring::signature::RsaKeyPair::public_key()` returns as DER, without
/// pulling in a general ASN.1 dependency for two field reads.
fn parse_rsa_public_key_der(der: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CoreError> {
    let mut pos = 0usize;
    expect_tag(der, &mut pos, 0x30)?;
    let _sequence_len = read_der_length(der, &mut pos)?;
    let modulus = read_der_integer(der, &mut pos)?;
    let exponent = read_der_integer(der, &mut pos)?;
    Ok((modulus, exponent))
}

fn expect_tag(bytes: &[u8], pos: &mut usize, expected: u8) -> Result<(), CoreError> {
    let tag = *bytes.get(*pos).ok_or_else(|| CoreError::HsmUnavailable("truncated RSA public key DER".into()))?;
    if tag != expected {
        return Err(CoreError::HsmUnavailable(format!("expected DER tag {expected:#x}, found {tag:#x}")));
    }
    *pos += 1;
    Ok(())
}

fn read_der_length(bytes: &[u8], pos: &mut usize) -> Result<usize, CoreError> {
    let first = *bytes.get(*pos).ok_or_else(|| CoreError::HsmUnavailable("truncated RSA public key DER".into()))?;
    *pos += 1;
    if first & 0x80 == 0 {
        return Ok(first as usize);
    }
    let num_bytes = (first & 0x7F) as usize;
    if num_bytes == 0 || num_bytes > 4 {
        return Err(CoreError::HsmUnavailable("unsupported DER length encoding".into()));
    }
    let mut len = 0usize;
    for _ in 0..num_bytes {
        let byte = *bytes.get(*pos).ok_or_else(|| CoreError::HsmUnavailable("truncated RSA public key DER".into()))?;
        *pos += 1;
        len = (len << 8) | byte as usize;
    }
    Ok(len)
}

fn read_der_integer(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, CoreError> {
    expect_tag(bytes, pos, 0x02)?;
    let len = read_der_length(bytes, pos)?;
    let end = pos.checked_add(len).ok_or_else(|| CoreError::HsmUnavailable("RSA public key DER length overflow".into()))?;
    let value = bytes
        .get(*pos..end)
        .ok_or_else(|| CoreError::HsmUnavailable("truncated RSA public key DER integer".into()))?
        .to_vec();
    *pos = end;
    let trimmed = if value.len() > 1 && value[0] == 0x00 { value[1..].to_vec() } else { value };
    Ok(trimmed)
}

pub fn write_pkcs8(directory: &Path, label: &str, der: &[u8]) -> std::io::Result<()> {
    std::fs::write(directory.join(format!("{label}.pk8")), der)
}
