//! Scorecard module: heuristic extraction of hole statistics from
//! conversation text, and round totals.

mod extractor;
mod summary;

pub use extractor::extract;
pub use summary::ScorecardSummary;
