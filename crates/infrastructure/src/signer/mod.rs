mod soft_hsm;

pub use soft_hsm::{write_pkcs8, SoftHsmSigner};
