use ksr_ceremony_domain::{Body, CeremonyConfig, Document, SignaturePolicy};

/// Everything a [`super::checks::Check`] needs to evaluate a document: the
/// document itself, the operator's configuration, the previous SKR (for
/// chain-linkage checks), and "now" — never read from a system clock
/// inside this crate.
pub struct PolicyContext<'a> {
    pub document: &'a Document,
    pub config: &'a CeremonyConfig,
    pub previous: Option<&'a Document>,
    pub now: u32,
}

impl<'a> PolicyContext<'a> {
    pub fn new(
        document: &'a Document,
        config: &'a CeremonyConfig,
        previous: Option<&'a Document>,
        now: u32,
    ) -> Self {
        Self {
            document,
            config,
            previous,
            now,
        }
    }

    /// The ZSK policy declared on this document — present on both
    /// request and response bodies, since a response always echoes it.
    pub fn zsk_policy(&self) -> &'a SignaturePolicy {
        match &self.document.body {
            Body::Request { policy, .. } => &policy.zsk,
            Body::Response { policy, .. } => &policy.zsk,
        }
    }

    /// The KSK policy, present only once the KSK operator has declared
    /// one — i.e. only on response bodies.
    pub fn ksk_policy(&self) -> Option<&'a SignaturePolicy> {
        match &self.document.body {
            Body::Request { .. } => None,
            Body::Response { policy, .. } => Some(&policy.ksk),
        }
    }
}
