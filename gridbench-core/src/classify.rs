//! Warmup Classification
//!
//! Every case runs its callback once, timed, before measurement. The
//! probe decides whether a full measurement is worth the budget: a
//! probe over the whole budget is skipped outright, one over half the
//! budget cannot amplify meaningfully and reports a sentinel, anything
//! faster is admitted.

use std::time::Duration;

/// Throughput reported for marginal cases instead of measuring.
pub const MARGINAL_THROUGHPUT: u64 = 1;

/// Admission decision for one case, derived from a single timed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Probe exceeded the whole budget; the case is not measured.
    Skipped,
    /// Probe exceeded half the budget; the sentinel is reported.
    Marginal,
    /// Fast enough for a full measurement.
    Measured,
}

/// Classify a case from its probe duration.
///
/// Pure in its inputs: the same probe and budget always classify the
/// same way.
pub fn classify(probe: Duration, budget: Duration) -> Classification {
    if probe > budget {
        Classification::Skipped
    } else if probe > budget / 2 {
        Classification::Marginal
    } else {
        Classification::Measured
    }
}
