//! Use cases, ports, and policy/schema engines for the root-zone KSK
//! ceremony — the layer that orchestrates the pure `domain` types against
//! the injected `Codec` and `Signer` capabilities.

pub mod inventory_reconciler;
pub mod policy;
pub mod ports;
pub mod schema_engine;
pub mod use_cases;

pub use ports::{Codec, HandleKind, KeyHandle, PublicKeyMaterial, Signer};
pub use schema_engine::{ResolvedSlot, SchemaEngine};
pub use use_cases::{run_ceremony, CeremonyInputs};
