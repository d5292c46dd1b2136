use crate::round::RoundStats;
use serde::Serialize;

/// Round totals shown on the scorecard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardSummary {
    pub holes_recorded: usize,
    /// Sum of recorded scores; holes without a score count as zero.
    pub total_score: u32,
    pub total_par: u32,
    pub fairways_hit: usize,
    pub greens_in_regulation: usize,
    pub total_putts: u32,
    pub up_and_downs: usize,
}

impl ScorecardSummary {
    pub fn from_stats(stats: &RoundStats) -> Self {
        let holes = stats.holes.values();
        let mut summary = Self {
            holes_recorded: stats.holes.len(),
            ..Self::default()
        };

        for hole in holes {
            summary.total_score = summary.total_score.saturating_add(hole.score.unwrap_or(0));
            summary.total_par = summary.total_par.saturating_add(hole.par);
            summary.total_putts = summary.total_putts.saturating_add(hole.putts.unwrap_or(0));
            if hole.fairway_hit == Some(true) {
                summary.fairways_hit += 1;
            }
            if hole.green_in_regulation == Some(true) {
                summary.greens_in_regulation += 1;
            }
            if hole.up_and_down == Some(true) {
                summary.up_and_downs += 1;
            }
        }

        summary
    }
}
