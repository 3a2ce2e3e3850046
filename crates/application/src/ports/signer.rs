use ksr_ceremony_domain::{AlgorithmParams, CoreError};

/// An opaque handle to a key inside the HSM, returned by [`Signer::list`].
/// Carries no key material — only enough for the signer implementation to
/// find the key again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle {
    pub label: String,
    pub kind: HandleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Public,
    Private,
}

/// The public half of a key, as read back from the HSM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    pub algorithm: u8,
    pub params: AlgorithmParams,
    pub raw_bytes: Vec<u8>,
}

/// The HSM capability the ceremony orchestrator depends on.
///
/// This is the seam between the pure core and the one genuinely
/// stateful, genuinely untestable-in-general dependency a signing
/// ceremony has. It makes no policy decisions — it will happily sign
/// anything it's asked to, which is exactly why the policy engine runs
/// to completion *before* any call into this trait.
pub trait Signer {
    /// Enumerate handles registered under `label`. Returns one handle for
    /// the public key, one for the private key, both, or neither — never
    /// an error for "not found"; an empty list is the not-found case.
    fn list(&self, label: &str) -> Result<Vec<KeyHandle>, CoreError>;

    fn public_key(&self, handle: &KeyHandle) -> Result<PublicKeyMaterial, CoreError>;

    /// Signs `message` with the private key at `handle`, using
    /// `algorithm`'s DNSSEC-specified padding/hash/encoding: PKCS#1 v1.5 +
    /// SHA-256 for RSA (algorithm 8), raw `r || s` for ECDSA P-256
    /// (algorithm 13).
    fn sign(&self, handle: &KeyHandle, algorithm: u8, message: &[u8]) -> Result<Vec<u8>, CoreError>;
}
