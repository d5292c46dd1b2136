//! Keyword-based scorecard extraction.
//!
//! A best-effort matcher over the text of the latest exchange. It is a
//! heuristic, not language understanding: the table below is the whole
//! vocabulary.
//!
//! | text contains            | field set                    |
//! |--------------------------|------------------------------|
//! | "hit" and "fairway"      | `fairway_hit = true`         |
//! | "miss" and "fairway"     | `fairway_hit = false`        |
//! | "hit" and "green"        | `green_in_regulation = true` |
//! | "miss" and "green"       | `green_in_regulation = false`|
//! | "two putt"               | `putts = 2`                  |
//! | "three putt"             | `putts = 3`                  |

use crate::round::RoundStats;

/// Fields recognized in one exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Findings {
    fairway_hit: Option<bool>,
    green_in_regulation: Option<bool>,
    putts: Option<u32>,
}

impl Findings {
    fn is_empty(&self) -> bool {
        self.fairway_hit.is_none() && self.green_in_regulation.is_none() && self.putts.is_none()
    }
}

fn scan(text: &str) -> Findings {
    let text = text.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    // First match wins per field.
    let fairway_hit = if has("hit") && has("fairway") {
        Some(true)
    } else if has("miss") && has("fairway") {
        Some(false)
    } else {
        None
    };

    let green_in_regulation = if has("hit") && has("green") {
        Some(true)
    } else if has("miss") && has("green") {
        Some(false)
    } else {
        None
    };

    let putts = if has("two putt") {
        Some(2)
    } else if has("three putt") {
        Some(3)
    } else {
        None
    };

    Findings {
        fairway_hit,
        green_in_regulation,
        putts,
    }
}

/// Updates the current hole of `stats` from `exchange_text`.
///
/// `exchange_text` is the golfer's latest message joined with the model's
/// latest reply. Matched fields are merged into the hole numbered
/// `stats.current_hole` (created with the default par when absent); fields
/// that did not match keep their recorded value. Without any match the
/// returned stats equal the input.
pub fn extract(exchange_text: &str, stats: &RoundStats) -> RoundStats {
    let findings = scan(exchange_text);
    let mut updated = stats.clone();
    if findings.is_empty() {
        return updated;
    }

    let hole = updated.hole_mut_or_default(stats.current_hole);
    if let Some(fairway_hit) = findings.fairway_hit {
        hole.fairway_hit = Some(fairway_hit);
    }
    if let Some(gir) = findings.green_in_regulation {
        hole.green_in_regulation = Some(gir);
    }
    if let Some(putts) = findings.putts {
        hole.putts = Some(putts);
    }

    tracing::debug!(
        "[Scorecard] Hole {} updated: fairway={:?} green={:?} putts={:?}",
        stats.current_hole,
        findings.fairway_hit,
        findings.green_in_regulation,
        findings.putts
    );
    updated
}
