pub mod codec;
pub mod signer;

pub use codec::Codec;
pub use signer::{HandleKind, KeyHandle, PublicKeyMaterial, Signer};
