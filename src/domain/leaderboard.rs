//! Leaderboard ranking of instrument summaries.
//!
//! Sorted descending by `return_pct`. The sort is stable, so instruments with the
//! same return keep their input order. The result is bounded to `top_n` entries.

use crate::domain::metrics::InstrumentSummary;

pub fn rank(mut summaries: Vec<InstrumentSummary>, top_n: usize) -> Vec<InstrumentSummary> {
    summaries.sort_by(|a, b| b.return_pct.total_cmp(&a.return_pct));
    summaries.truncate(top_n);
    summaries
}
