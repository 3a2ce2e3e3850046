pub mod run_ceremony;
pub mod verify_skr;

pub use run_ceremony::{run_ceremony, CeremonyInputs};
