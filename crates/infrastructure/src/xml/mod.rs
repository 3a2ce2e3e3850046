//! `Codec` adapter over the KSR/SKR XML schema, built on `quick-xml`'s
//! streaming reader/writer rather than its serde integration — the schema
//! has ordering and cardinality rules a derive can't express (exactly one
//! `KSK` block in a `Response`, zero in a `Request`; `sign` keys must be a
//! subset of `publish ∪ revoke`), so every field is read and written by an
//! explicit name lookup rather than left to a derive's default ordering.

mod decode;
mod encode;
mod tree;

use ksr_ceremony_application::Codec;
use ksr_ceremony_domain::{CoreError, Document};

#[derive(Debug, Default, Clone, Copy)]
pub struct XmlCodec;

impl Codec for XmlCodec {
    fn decode(&self, xml: &[u8]) -> Result<Document, CoreError> {
        decode::decode(xml)
    }

    fn encode(&self, document: &Document) -> Result<Vec<u8>, CoreError> {
        encode::encode(document)
    }
}
