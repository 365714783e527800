//! Run-scoped configuration and counters.

use serde::Serialize;

use crate::rewriter::AnomalyCounts;

/// Configuration for one conversion run. Rewriting output is a pure
/// function of statement text plus this config; the counters in
/// [`RunStats`] are observational only.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// Schema substituted when a statement carries none.
    pub schema: String,
    /// Character bound oversized literals are cut to.
    pub truncate_to: usize,
    /// Line threshold per insert chunk file.
    pub chunk_lines: u64,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self {
            schema: "ADMIN".to_string(),
            truncate_to: 100,
            chunk_lines: 100_000,
        }
    }
}

/// Counters accumulated over a run, reported at the end (optionally as
/// JSON).
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub statements_seen: u64,
    pub tables_rewritten: u64,
    pub inserts_rewritten: u64,
    pub statements_skipped: u64,
    pub statements_commented: u64,
    pub chunks_written: u64,
    pub anomalies: AnomalyCounts,
}
