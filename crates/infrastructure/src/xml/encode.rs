//! Emits a [`Document`] as indented KSR/SKR XML.
//!
//! Element and attribute order is fixed by the functions below, never by
//! iteration order over a map, so two runs over the same `Document` byte-
//! for-byte match — required for the response document's own canonical
//! determinism property.

use base64::Engine;

use ksr_ceremony_domain::{AlgorithmParams, Body, Bundle, Document, Key, Signature, SignaturePolicy};
use ksr_ceremony_domain::CoreError;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const BASE64_LINE_WIDTH: usize = 64;

pub fn encode(document: &Document) -> Result<Vec<u8>, CoreError> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    let mut ksr_start = BytesStart::new("KSR");
    let serial_text = document.serial.to_string();
    ksr_start.push_attribute(("id", document.id.as_str()));
    ksr_start.push_attribute(("serial", serial_text.as_str()));
    ksr_start.push_attribute(("domain", document.domain.as_str()));
    write_event(&mut writer, Event::Start(ksr_start))?;

    match &document.body {
        Body::Request { policy, bundles } => {
            open_body(&mut writer, "Request", document.timestamp)?;
            write_event(&mut writer, Event::Start(BytesStart::new("RequestPolicy")))?;
            write_signature_policy(&mut writer, "ZSK", &policy.zsk)?;
            write_event(&mut writer, Event::End(BytesEnd::new("RequestPolicy")))?;
            for bundle in bundles {
                write_bundle(&mut writer, "RequestBundle", bundle)?;
            }
            write_event(&mut writer, Event::End(BytesEnd::new("Request")))?;
        }
        Body::Response { policy, bundles } => {
            open_body(&mut writer, "Response", document.timestamp)?;
            write_event(&mut writer, Event::Start(BytesStart::new("ResponsePolicy")))?;
            write_signature_policy(&mut writer, "KSK", &policy.ksk)?;
            write_signature_policy(&mut writer, "ZSK", &policy.zsk)?;
            write_event(&mut writer, Event::End(BytesEnd::new("ResponsePolicy")))?;
            for bundle in bundles {
                write_bundle(&mut writer, "ResponseBundle", bundle)?;
            }
            write_event(&mut writer, Event::End(BytesEnd::new("Response")))?;
        }
    }

    write_event(&mut writer, Event::End(BytesEnd::new("KSR")))?;
    Ok(buffer)
}

fn open_body(writer: &mut Writer<&mut Vec<u8>>, name: &str, timestamp: Option<u32>) -> Result<(), CoreError> {
    let mut start = BytesStart::new(name);
    let text;
    if let Some(ts) = timestamp {
        text = ts.to_string();
        start.push_attribute(("timestamp", text.as_str()));
    }
    write_event(writer, Event::Start(start))
}

fn write_signature_policy(writer: &mut Writer<&mut Vec<u8>>, tag: &str, policy: &SignaturePolicy) -> Result<(), CoreError> {
    write_event(writer, Event::Start(BytesStart::new(tag)))?;
    write_text_element(writer, "PublishSafety", &policy.publish_safety.to_string())?;
    write_text_element(writer, "RetireSafety", &policy.retire_safety.to_string())?;
    write_text_element(writer, "MaxSignatureValidity", &policy.max_signature_validity.to_string())?;
    write_text_element(writer, "MinSignatureValidity", &policy.min_signature_validity.to_string())?;
    write_text_element(writer, "MaxValidityOverlap", &policy.max_validity_overlap.to_string())?;
    write_text_element(writer, "MinValidityOverlap", &policy.min_validity_overlap.to_string())?;
    for entry in &policy.algorithm_policy {
        write_algorithm_policy_entry(writer, entry)?;
    }
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

fn write_algorithm_policy_entry(
    writer: &mut Writer<&mut Vec<u8>>,
    entry: &ksr_ceremony_domain::AlgorithmPolicyEntry,
) -> Result<(), CoreError> {
    write_event(writer, Event::Start(BytesStart::new("SignatureAlgorithm")))?;
    match &entry.params {
        AlgorithmParams::Rsa { size, exponent } => {
            write_event(writer, Event::Start(BytesStart::new("RSA")))?;
            write_text_element(writer, "Size", &size.to_string())?;
            write_text_element(writer, "Exponent", &exponent.to_string())?;
            write_event(writer, Event::End(BytesEnd::new("RSA")))?;
        }
        AlgorithmParams::Ecdsa { size } => {
            write_event(writer, Event::Start(BytesStart::new("ECDSA")))?;
            write_text_element(writer, "Size", &size.to_string())?;
            write_event(writer, Event::End(BytesEnd::new("ECDSA")))?;
        }
        AlgorithmParams::Dsa { size } => {
            write_event(writer, Event::Start(BytesStart::new("DSA")))?;
            write_text_element(writer, "Size", &size.to_string())?;
            write_event(writer, Event::End(BytesEnd::new("DSA")))?;
        }
    }
    write_event(writer, Event::End(BytesEnd::new("SignatureAlgorithm")))
}

fn write_bundle(writer: &mut Writer<&mut Vec<u8>>, tag: &str, bundle: &Bundle) -> Result<(), CoreError> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("id", bundle.id.as_str()));
    write_event(writer, Event::Start(start))?;
    write_text_element(writer, "Inception", &bundle.inception.to_string())?;
    write_text_element(writer, "Expiration", &bundle.expiration.to_string())?;
    for hint in &bundle.signer_hints {
        write_text_element(writer, "Signer", hint)?;
    }
    for key in bundle.keys_canonical_order() {
        write_key(writer, key)?;
    }
    for signature in bundle.signatures_canonical_order() {
        write_signature(writer, signature)?;
    }
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

fn write_key(writer: &mut Writer<&mut Vec<u8>>, key: &Key) -> Result<(), CoreError> {
    let mut start = BytesStart::new("Key");
    let key_tag_text = key.key_tag.to_string();
    start.push_attribute(("keyIdentifier", key.key_identifier.as_str()));
    start.push_attribute(("keyTag", key_tag_text.as_str()));
    write_event(writer, Event::Start(start))?;
    write_text_element(writer, "TTL", &key.ttl.to_string())?;
    write_text_element(writer, "Flags", &key.flags.to_string())?;
    write_text_element(writer, "Protocol", &key.protocol.to_string())?;
    write_text_element(writer, "Algorithm", &key.algorithm.to_string())?;
    write_text_element(writer, "PublicKey", &wrap_base64(&key.public_key))?;
    write_event(writer, Event::End(BytesEnd::new("Key")))
}

fn write_signature(writer: &mut Writer<&mut Vec<u8>>, signature: &Signature) -> Result<(), CoreError> {
    write_event(writer, Event::Start(BytesStart::new("Signature")))?;
    write_text_element(writer, "KeyIdentifier", &signature.key_identifier)?;
    write_text_element(writer, "TTL", &signature.ttl.to_string())?;
    write_text_element(writer, "TypeCovered", "DNSKEY")?;
    write_text_element(writer, "Algorithm", &signature.algorithm.to_string())?;
    write_text_element(writer, "Labels", &signature.labels.to_string())?;
    write_text_element(writer, "OriginalTTL", &signature.original_ttl.to_string())?;
    write_text_element(writer, "SignatureInception", &signature.signature_inception.to_string())?;
    write_text_element(writer, "SignatureExpiration", &signature.signature_expiration.to_string())?;
    write_text_element(writer, "KeyTag", &signature.key_tag.to_string())?;
    write_text_element(writer, "SignersName", &signature.signers_name)?;
    write_text_element(writer, "SignatureData", &wrap_base64(&signature.signature_data))?;
    write_event(writer, Event::End(BytesEnd::new("Signature")))
}

fn write_text_element(writer: &mut Writer<&mut Vec<u8>>, tag: &str, text: &str) -> Result<(), CoreError> {
    write_event(writer, Event::Start(BytesStart::new(tag)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

fn write_event(writer: &mut Writer<&mut Vec<u8>>, event: Event) -> Result<(), CoreError> {
    writer
        .write_event(event)
        .map_err(|e| CoreError::MalformedXml(format!("xml write error: {e}")))
}

fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    let chars: Vec<char> = encoded.chars().collect();
    chars
        .chunks(BASE64_LINE_WIDTH)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
