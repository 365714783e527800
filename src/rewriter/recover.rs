//! Per-statement failure policy.
//!
//! No statement-level anomaly aborts a run. Structural anomalies become
//! clearly marked inert comments, value anomalies are substituted in
//! place, and everything is counted so the run summary gives a
//! deterministic audit trail.

use serde::Serialize;

/// Statement-level anomalies recovered without aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// Value-tuple arity does not match the column-list arity.
    ArityMismatch { expected: usize, found: usize },
    /// End-of-input reached inside a string literal or comment.
    UnterminatedLiteral,
    /// Statement structure could not be repaired.
    Malformed { reason: String },
    /// Numeric literal outside the representable target range.
    OutOfRangeNumeric,
    /// Literal too long for a derived identifier; truncated.
    OversizedValue,
    /// Administrative statement with no target-dialect equivalent.
    UnsupportedStatement,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::ArityMismatch { expected, found } => {
                write!(f, "arity mismatch: {} columns, {} values", expected, found)
            }
            Anomaly::UnterminatedLiteral => write!(f, "unterminated literal at end of input"),
            Anomaly::Malformed { reason } => write!(f, "malformed: {}", reason),
            Anomaly::OutOfRangeNumeric => write!(f, "out-of-range numeric literal"),
            Anomaly::OversizedValue => write!(f, "oversized literal value"),
            Anomaly::UnsupportedStatement => write!(f, "no SQL Server equivalent"),
        }
    }
}

/// Per-anomaly counters reported in the run summary.
#[derive(Debug, Default, Clone, Serialize)]
pub struct AnomalyCounts {
    pub arity_mismatch: u64,
    pub unterminated_literal: u64,
    pub malformed: u64,
    pub out_of_range_numeric: u64,
    pub oversized_value: u64,
    pub unsupported_statement: u64,
}

impl AnomalyCounts {
    pub fn total(&self) -> u64 {
        self.arity_mismatch
            + self.unterminated_literal
            + self.malformed
            + self.out_of_range_numeric
            + self.oversized_value
            + self.unsupported_statement
    }
}

/// Central recovery policy: counts anomalies and renders the inert
/// comments that replace unemittable statements.
#[derive(Debug, Default)]
pub struct RecoveryGuard {
    counts: AnomalyCounts,
}

impl RecoveryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, anomaly: &Anomaly) {
        match anomaly {
            Anomaly::ArityMismatch { .. } => self.counts.arity_mismatch += 1,
            Anomaly::UnterminatedLiteral => self.counts.unterminated_literal += 1,
            Anomaly::Malformed { .. } => self.counts.malformed += 1,
            Anomaly::OutOfRangeNumeric => self.counts.out_of_range_numeric += 1,
            Anomaly::OversizedValue => self.counts.oversized_value += 1,
            Anomaly::UnsupportedStatement => self.counts.unsupported_statement += 1,
        }
    }

    /// Replace a statement that cannot be emitted as executable SQL with a
    /// marked skip comment. Every source line survives, commented out.
    pub fn skip_comment(&mut self, anomaly: &Anomaly, stmt: &str) -> String {
        self.record(anomaly);
        let mut out = format!("-- SKIPPED ({}):", anomaly);
        for line in stmt.trim().lines() {
            out.push_str("\n-- ");
            out.push_str(line);
        }
        out
    }

    /// Preserve a statement that must not be forwarded verbatim as an
    /// inert comment with a note.
    pub fn preserve_comment(&mut self, anomaly: &Anomaly, stmt: &str, note: &str) -> String {
        self.record(anomaly);
        let mut out = String::new();
        for (i, line) in stmt.trim().lines().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str("-- ");
            out.push_str(line);
        }
        out.push_str(" (");
        out.push_str(note);
        out.push(')');
        out
    }

    pub fn counts(&self) -> &AnomalyCounts {
        &self.counts
    }
}
