//! KSR/SKR schema walk over a buffered [`XmlNode`] tree.
//!
//! Every field is read explicitly by name, with a `MalformedXml` or
//! `SchemaViolation` error as soon as something required is missing,
//! rather than leaning on a derive macro that can't express "one or more
//! of these in this order, duplicates rejected".

use base64::Engine;

use ksr_ceremony_domain::algorithm::{ALG_DSA_SHA1, ALG_ECDSA_P256_SHA256, ALG_RSA_SHA256};
use ksr_ceremony_domain::signature::RRTYPE_DNSKEY;
use ksr_ceremony_domain::{
    AlgorithmParams, AlgorithmPolicyEntry, Body, Bundle, Document, IsoDuration, Key,
    RequestPolicy, ResponsePolicy, Signature, SignaturePolicy,
};
use ksr_ceremony_domain::CoreError;

use super::tree::{parse_tree, XmlNode};

pub fn decode(xml: &[u8]) -> Result<Document, CoreError> {
    let root = parse_tree(xml)?;
    if root.name != "KSR" {
        return Err(CoreError::SchemaViolation(format!(
            "expected root element KSR, found {}",
            root.name
        )));
    }

    let id = required_attr(&root, "id")?.to_string();
    let serial = required_attr(&root, "serial")?
        .parse::<u64>()
        .map_err(|_| CoreError::MalformedXml("KSR.serial is not an integer".into()))?;
    let domain = required_attr(&root, "domain")?.to_string();

    let body_node = root
        .children
        .first()
        .ok_or_else(|| CoreError::SchemaViolation("KSR has no Request/Response child".into()))?;

    let timestamp = match body_node.attr("timestamp") {
        Some(text) => Some(
            text.parse::<u32>()
                .map_err(|_| CoreError::MalformedXml("timestamp is not an integer".into()))?,
        ),
        None => None,
    };

    let body = match body_node.name.as_str() {
        "Request" => decode_request(body_node)?,
        "Response" => decode_response(body_node)?,
        other => {
            return Err(CoreError::SchemaViolation(format!(
                "expected Request or Response, found {other}"
            )))
        }
    };

    Ok(Document { id, serial, domain, timestamp, body })
}

fn decode_request(body_node: &XmlNode) -> Result<Body, CoreError> {
    let policy_node = required_child(body_node, "RequestPolicy")?;
    let zsk_node = required_child(policy_node, "ZSK")?;
    let zsk = decode_signature_policy(zsk_node)?;

    let bundles = body_node
        .children_named("RequestBundle")
        .map(decode_bundle)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Body::Request { policy: RequestPolicy { zsk }, bundles })
}

fn decode_response(body_node: &XmlNode) -> Result<Body, CoreError> {
    let policy_node = required_child(body_node, "ResponsePolicy")?;
    let ksk_node = required_child(policy_node, "KSK")?;
    let zsk_node = required_child(policy_node, "ZSK")?;
    let ksk = decode_signature_policy(ksk_node)?;
    let zsk = decode_signature_policy(zsk_node)?;

    let bundles = body_node
        .children_named("ResponseBundle")
        .map(decode_bundle)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Body::Response { policy: ResponsePolicy { ksk, zsk }, bundles })
}

fn decode_signature_policy(node: &XmlNode) -> Result<SignaturePolicy, CoreError> {
    Ok(SignaturePolicy {
        publish_safety: decode_duration_child(node, "PublishSafety")?,
        retire_safety: decode_duration_child(node, "RetireSafety")?,
        max_signature_validity: decode_duration_child(node, "MaxSignatureValidity")?,
        min_signature_validity: decode_duration_child(node, "MinSignatureValidity")?,
        max_validity_overlap: decode_duration_child(node, "MaxValidityOverlap")?,
        min_validity_overlap: decode_duration_child(node, "MinValidityOverlap")?,
        algorithm_policy: node
            .children_named("SignatureAlgorithm")
            .map(decode_algorithm_policy_entry)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn decode_duration_child(node: &XmlNode, name: &str) -> Result<IsoDuration, CoreError> {
    let child = required_child(node, name)?;
    IsoDuration::parse(child.text_trim())
}

fn decode_algorithm_policy_entry(node: &XmlNode) -> Result<AlgorithmPolicyEntry, CoreError> {
    if let Some(rsa) = node.child("RSA") {
        let size = required_child_text(rsa, "Size")?
            .parse::<u32>()
            .map_err(|_| CoreError::MalformedXml("RSA.Size is not an integer".into()))?;
        let exponent = required_child_text(rsa, "Exponent")?
            .parse::<u64>()
            .map_err(|_| CoreError::MalformedXml("RSA.Exponent is not an integer".into()))?;
        return Ok(AlgorithmPolicyEntry {
            algorithm: ALG_RSA_SHA256,
            params: AlgorithmParams::Rsa { size, exponent },
        });
    }
    if let Some(ecdsa) = node.child("ECDSA") {
        let size = required_child_text(ecdsa, "Size")?
            .parse::<u32>()
            .map_err(|_| CoreError::MalformedXml("ECDSA.Size is not an integer".into()))?;
        return Ok(AlgorithmPolicyEntry {
            algorithm: ALG_ECDSA_P256_SHA256,
            params: AlgorithmParams::Ecdsa { size },
        });
    }
    if let Some(dsa) = node.child("DSA") {
        let size = required_child_text(dsa, "Size")?
            .parse::<u32>()
            .map_err(|_| CoreError::MalformedXml("DSA.Size is not an integer".into()))?;
        return Ok(AlgorithmPolicyEntry {
            algorithm: ALG_DSA_SHA1,
            params: AlgorithmParams::Dsa { size },
        });
    }
    Err(CoreError::SchemaViolation(
        "SignatureAlgorithm has no RSA/DSA/ECDSA child".into(),
    ))
}

fn decode_bundle(node: &XmlNode) -> Result<Bundle, CoreError> {
    let id = required_attr(node, "id")?.to_string();
    let inception = required_child_text(node, "Inception")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Bundle.Inception is not an integer".into()))?;
    let expiration = required_child_text(node, "Expiration")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Bundle.Expiration is not an integer".into()))?;
    if expiration <= inception {
        return Err(CoreError::SchemaViolation(format!(
            "bundle {id:?} expiration {expiration} does not follow inception {inception}"
        )));
    }

    let signer_hints = node.children_named("Signer").map(|n| n.text_trim().to_string()).collect();

    let keys = node.children_named("Key").map(decode_key).collect::<Result<Vec<_>, _>>()?;
    let signatures = node
        .children_named("Signature")
        .map(decode_signature)
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = std::collections::HashSet::new();
    for key in &keys {
        if !seen.insert(key.key_identifier.clone()) {
            return Err(CoreError::DuplicateKeyIdentifier(key.key_identifier.clone()));
        }
    }

    Ok(Bundle { id, inception, expiration, keys, signatures, signer_hints })
}

fn decode_key(node: &XmlNode) -> Result<Key, CoreError> {
    let key_identifier = required_attr(node, "keyIdentifier")?.to_string();
    let key_tag = required_attr(node, "keyTag")?
        .parse::<u16>()
        .map_err(|_| CoreError::MalformedXml("Key.keyTag is not an integer".into()))?;
    let ttl = required_child_text(node, "TTL")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Key.TTL is not an integer".into()))?;
    let flags = required_child_text(node, "Flags")?
        .parse::<u16>()
        .map_err(|_| CoreError::MalformedXml("Key.Flags is not an integer".into()))?;
    let protocol = required_child_text(node, "Protocol")?
        .parse::<u8>()
        .map_err(|_| CoreError::MalformedXml("Key.Protocol is not an integer".into()))?;
    let algorithm = required_child_text(node, "Algorithm")?
        .parse::<u8>()
        .map_err(|_| CoreError::MalformedXml("Key.Algorithm is not an integer".into()))?;
    check_known_algorithm(algorithm, &key_identifier)?;
    let public_key = decode_base64(required_child_text(node, "PublicKey")?)?;

    Ok(Key { key_identifier, key_tag, ttl, flags, protocol, algorithm, public_key })
}

fn decode_signature(node: &XmlNode) -> Result<Signature, CoreError> {
    let key_identifier = required_child_text(node, "KeyIdentifier")?.to_string();
    let ttl = required_child_text(node, "TTL")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Signature.TTL is not an integer".into()))?;
    let type_covered = decode_type_covered(required_child_text(node, "TypeCovered")?)?;
    let algorithm = required_child_text(node, "Algorithm")?
        .parse::<u8>()
        .map_err(|_| CoreError::MalformedXml("Signature.Algorithm is not an integer".into()))?;
    check_known_algorithm(algorithm, &key_identifier)?;
    let labels = required_child_text(node, "Labels")?
        .parse::<u8>()
        .map_err(|_| CoreError::MalformedXml("Signature.Labels is not an integer".into()))?;
    let original_ttl = required_child_text(node, "OriginalTTL")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Signature.OriginalTTL is not an integer".into()))?;
    let signature_inception = required_child_text(node, "SignatureInception")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Signature.SignatureInception is not an integer".into()))?;
    let signature_expiration = required_child_text(node, "SignatureExpiration")?
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedXml("Signature.SignatureExpiration is not an integer".into()))?;
    let key_tag = required_child_text(node, "KeyTag")?
        .parse::<u16>()
        .map_err(|_| CoreError::MalformedXml("Signature.KeyTag is not an integer".into()))?;
    let signers_name = required_child_text(node, "SignersName")?.to_string();
    let signature_data = decode_base64(required_child_text(node, "SignatureData")?)?;

    Ok(Signature {
        key_identifier,
        ttl,
        type_covered,
        algorithm,
        labels,
        original_ttl,
        signature_inception,
        signature_expiration,
        key_tag,
        signers_name,
        signature_data,
    })
}

fn decode_type_covered(text: &str) -> Result<u16, CoreError> {
    if let Ok(n) = text.parse::<u16>() {
        return Ok(n);
    }
    match text {
        "DNSKEY" => Ok(RRTYPE_DNSKEY),
        other => Err(CoreError::MalformedXml(format!("unrecognized TypeCovered {other:?}"))),
    }
}

/// Structural algorithm-number check: rejects numbers this codec has no
/// wire encoding for at all. Whether a *known* algorithm is allowed for
/// this particular ceremony is the `ApprovedAlgorithms` policy check's job,
/// not the codec's — the codec has no configuration to consult.
fn check_known_algorithm(algorithm: u8, key_identifier: &str) -> Result<(), CoreError> {
    match algorithm {
        ALG_DSA_SHA1 | ALG_RSA_SHA256 | ALG_ECDSA_P256_SHA256 => Ok(()),
        other => Err(CoreError::UnsupportedAlgorithm {
            algorithm: other,
            key_identifier: key_identifier.to_string(),
        }),
    }
}

fn decode_base64(text: &str) -> Result<Vec<u8>, CoreError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| CoreError::MalformedXml(format!("invalid base64: {e}")))
}

fn required_attr<'a>(node: &'a XmlNode, name: &str) -> Result<&'a str, CoreError> {
    node.attr(name)
        .ok_or_else(|| CoreError::SchemaViolation(format!("{} missing required attribute {name:?}", node.name)))
}

fn required_child<'a>(node: &'a XmlNode, name: &str) -> Result<&'a XmlNode, CoreError> {
    node.child(name)
        .ok_or_else(|| CoreError::SchemaViolation(format!("{} missing required child {name:?}", node.name)))
}

fn required_child_text<'a>(node: &'a XmlNode, name: &str) -> Result<&'a str, CoreError> {
    Ok(required_child(node, name)?.text_trim())
}
