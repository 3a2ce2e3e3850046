use ksr_ceremony_domain::{CoreError, Document};

/// The XML encode/decode boundary, injected so the orchestrator never
/// depends on a concrete XML library directly.
pub trait Codec {
    fn decode(&self, xml: &[u8]) -> Result<Document, CoreError>;
    fn encode(&self, document: &Document) -> Result<Vec<u8>, CoreError>;
}
