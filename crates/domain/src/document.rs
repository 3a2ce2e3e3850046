use serde::{Deserialize, Serialize};

use crate::bundle::Bundle;
use crate::policy::{RequestPolicy, ResponsePolicy};

/// The two document kinds exchanged in a ceremony. A `Document` is
/// immutable once constructed; there is no in-place mutation path from
/// request to response — the orchestrator builds a brand new `Document`
/// for the `Response` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Request {
        policy: RequestPolicy,
        bundles: Vec<Bundle>,
    },
    Response {
        policy: ResponsePolicy,
        bundles: Vec<Bundle>,
    },
}

impl Body {
    pub fn bundles(&self) -> &[Bundle] {
        match self {
            Body::Request { bundles, .. } => bundles,
            Body::Response { bundles, .. } => bundles,
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Body::Response { .. })
    }
}

/// A full KSR or SKR document: top-level identity plus either a `Request`
/// or a `Response` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub serial: u64,
    pub domain: String,
    pub timestamp: Option<u32>,
    pub body: Body,
}

impl Document {
    pub fn bundles(&self) -> &[Bundle] {
        self.body.bundles()
    }

    pub fn first_bundle(&self) -> Option<&Bundle> {
        self.bundles().first()
    }

    pub fn last_bundle(&self) -> Option<&Bundle> {
        self.bundles().last()
    }
}
