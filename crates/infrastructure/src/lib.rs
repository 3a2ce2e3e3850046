//! Concrete adapters for the root-zone KSK ceremony: the XML `Codec`, the
//! file-backed `SoftHsmSigner`, and crash-safe file I/O. Everything here
//! implements a trait declared in `ksr-ceremony-application::ports`; the
//! orchestrator never references these types directly.

pub mod io;
pub mod signer;
pub mod xml;

pub use io::write_atomically;
pub use signer::{write_pkcs8, SoftHsmSigner};
pub use xml::XmlCodec;
