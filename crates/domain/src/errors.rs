use thiserror::Error;

/// A single policy check failure, named by the invariant it violates.
///
/// Carries the offending document identifiers so a reporter can print
/// something an operator can act on without re-deriving context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub check_name: &'static str,
    pub bundle_id: Option<String>,
    pub key_identifier: Option<String>,
    pub message: String,
}

impl Violation {
    pub fn new(check_name: &'static str, message: impl Into<String>) -> Self {
        Self {
            check_name,
            bundle_id: None,
            key_identifier: None,
            message: message.into(),
        }
    }

    pub fn with_bundle(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    pub fn with_key(mut self, key_identifier: impl Into<String>) -> Self {
        self.key_identifier = Some(key_identifier.into());
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.check_name, self.message)?;
        if let Some(bundle_id) = &self.bundle_id {
            write!(f, " (bundle={bundle_id})")?;
        }
        if let Some(key_identifier) = &self.key_identifier {
            write!(f, " (key={key_identifier})")?;
        }
        Ok(())
    }
}

/// Every failure mode the core ceremony pipeline can produce.
///
/// Policy violations are collected into a set via `PolicyViolation`; every
/// other variant is fail-fast. No variant is ever recovered silently.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("unsupported algorithm {algorithm} for {key_identifier}")]
    UnsupportedAlgorithm {
        algorithm: u8,
        key_identifier: String,
    },

    #[error("duplicate key identifier {0:?} within bundle")]
    DuplicateKeyIdentifier(String),

    #[error("policy violation(s): {}", format_violations(.0))]
    PolicyViolation(Vec<Violation>),

    #[error("signature verification failed for key {key_identifier} in bundle {bundle_id}")]
    SignatureVerificationFailed {
        bundle_id: String,
        key_identifier: String,
    },

    #[error("inventory mismatch for {identifier}: {reason}")]
    InventoryMismatch { identifier: String, reason: String },

    #[error("HSM unavailable: {0}")]
    HsmUnavailable(String),

    #[error("signing failed for {identifier} ({algorithm}): {reason}")]
    SigningFailed {
        identifier: String,
        algorithm: u8,
        reason: String,
    },

    #[error("chain linkage failed: {0}")]
    ChainLinkageFailed(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// Maps the failure onto the CLI wrapper's documented exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::PolicyViolation(_)
            | CoreError::SignatureVerificationFailed { .. }
            | CoreError::ChainLinkageFailed(_) => 1,
            CoreError::MalformedXml(_)
            | CoreError::SchemaViolation(_)
            | CoreError::UnsupportedAlgorithm { .. }
            | CoreError::DuplicateKeyIdentifier(_) => 2,
            CoreError::HsmUnavailable(_) | CoreError::SigningFailed { .. } => 3,
            CoreError::InventoryMismatch { .. } | CoreError::ConfigurationError(_) => 4,
        }
    }
}
