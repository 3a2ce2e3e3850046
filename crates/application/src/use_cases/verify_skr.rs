//! Equivalent validation of any SKR on ingest: the same machinery the
//! orchestrator runs against a document it just produced, reused to check
//! a previously issued SKR before trusting it as chain-linkage state.

use ksr_ceremony_domain::{CeremonyConfig, CoreError, Document};

use crate::policy::{PolicyContext, PolicyEngine};

/// Runs the full enabled check set against `document`, with `previous`
/// available for chain-linkage checks (pass `None` when validating the
/// oldest document in a chain, e.g. at bootstrap).
pub fn verify(
    document: &Document,
    config: &CeremonyConfig,
    previous: Option<&Document>,
    now: u32,
) -> Result<(), CoreError> {
    let engine = PolicyEngine::from_config(config);
    let ctx = PolicyContext::new(document, config, previous, now);
    engine.evaluate(&ctx)
}
