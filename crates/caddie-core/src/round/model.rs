//! Round aggregate types.
//!
//! `GolfData` is the root aggregate persisted as a single record. It holds
//! every round's message log plus the scorecard statistics derived for it.

use super::message::Message;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Par assumed for a hole the golfer has not described yet.
pub const DEFAULT_PAR: u32 = 4;

/// Hole a new round starts on.
pub const FIRST_HOLE: u32 = 1;

/// Upper bound accepted for a hole's strokes or par.
pub const MAX_HOLE_STROKES: u32 = 20;

/// Statistics recorded for a single hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleStats {
    pub hole_number: u32,
    pub par: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fairway_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_in_regulation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_and_down: Option<bool>,
}

impl HoleStats {
    /// Creates an empty record for `hole_number` with the given par.
    pub fn new(hole_number: u32, par: u32) -> Self {
        Self {
            hole_number,
            par,
            score: None,
            fairway_hit: None,
            green_in_regulation: None,
            putts: None,
            up_and_down: None,
        }
    }

    /// Merges `other` into `self`.
    ///
    /// Par is taken from `other`; optional fields are only overwritten when
    /// `other` carries a value, so previously recorded facts survive.
    pub fn merge(&mut self, other: &HoleStats) {
        self.par = other.par;
        if other.score.is_some() {
            self.score = other.score;
        }
        if other.fairway_hit.is_some() {
            self.fairway_hit = other.fairway_hit;
        }
        if other.green_in_regulation.is_some() {
            self.green_in_regulation = other.green_in_regulation;
        }
        if other.putts.is_some() {
            self.putts = other.putts;
        }
        if other.up_and_down.is_some() {
            self.up_and_down = other.up_and_down;
        }
    }
}

/// Scorecard statistics for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStats {
    pub round_id: String,
    /// Creation timestamp (RFC 3339).
    pub date: String,
    /// Holes keyed by hole number, in the order they were first recorded.
    /// Stored on disk as a list.
    #[serde(default, with = "holes_as_list")]
    pub holes: IndexMap<u32, HoleStats>,
    /// Advisory; only moved by explicit golfer action.
    #[serde(default = "first_hole")]
    pub current_hole: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
}

fn first_hole() -> u32 {
    FIRST_HOLE
}

impl RoundStats {
    /// Creates empty statistics for a round.
    pub fn new(round_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            round_id: round_id.into(),
            date: date.into(),
            holes: IndexMap::new(),
            current_hole: FIRST_HOLE,
            course_name: None,
        }
    }

    /// Returns the record for `hole_number`, if any.
    pub fn hole(&self, hole_number: u32) -> Option<&HoleStats> {
        self.holes.get(&hole_number)
    }

    /// Returns the record for `hole_number`, creating it with
    /// [`DEFAULT_PAR`] when absent.
    pub fn hole_mut_or_default(&mut self, hole_number: u32) -> &mut HoleStats {
        self.holes
            .entry(hole_number)
            .or_insert_with(|| HoleStats::new(hole_number, DEFAULT_PAR))
    }

    /// Inserts `hole`, merging into an existing record with the same number.
    pub fn upsert_hole(&mut self, hole: HoleStats) {
        upsert(&mut self.holes, hole);
    }
}

fn upsert(holes: &mut IndexMap<u32, HoleStats>, hole: HoleStats) {
    match holes.get_mut(&hole.hole_number) {
        Some(existing) => existing.merge(&hole),
        None => {
            holes.insert(hole.hole_number, hole);
        }
    }
}

mod holes_as_list {
    use super::{HoleStats, upsert};
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(holes: &IndexMap<u32, HoleStats>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(holes.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<IndexMap<u32, HoleStats>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<HoleStats>::deserialize(deserializer)?;
        let mut holes = IndexMap::with_capacity(list.len());
        for hole in list {
            upsert(&mut holes, hole);
        }
        Ok(holes)
    }
}

/// The root aggregate: every round and its statistics.
///
/// Invariants:
/// - every key of `round_stats` is a key of `rounds`
/// - `current_round_id`, when set, is a key of `rounds`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfData {
    /// Message logs keyed by round id, in round creation order.
    pub rounds: IndexMap<String, Vec<Message>>,
    /// Statistics keyed by round id. May lack entries for legacy rounds.
    #[serde(default)]
    pub round_stats: IndexMap<String, RoundStats>,
    #[serde(default)]
    pub current_round_id: Option<String>,
}

impl GolfData {
    /// Returns true if `round_id` names a round in this aggregate.
    pub fn contains_round(&self, round_id: &str) -> bool {
        self.rounds.contains_key(round_id)
    }

    /// Returns the message log of `round_id`.
    pub fn messages(&self, round_id: &str) -> Option<&[Message]> {
        self.rounds.get(round_id).map(Vec::as_slice)
    }

    /// Returns the statistics of `round_id`.
    pub fn stats(&self, round_id: &str) -> Option<&RoundStats> {
        self.round_stats.get(round_id)
    }

    /// Returns true when a current round is set.
    pub fn has_current_round(&self) -> bool {
        self.current_round_id.is_some()
    }

    /// Restores the aggregate invariants.
    ///
    /// Drops statistics without a matching round and clears a dangling
    /// current round id. Returns true if anything was changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.round_stats.len();
        let rounds = &self.rounds;
        self.round_stats.retain(|round_id, _| rounds.contains_key(round_id));
        let mut changed = before != self.round_stats.len();

        if let Some(current) = &self.current_round_id {
            if !self.rounds.contains_key(current) {
                self.current_round_id = None;
                changed = true;
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_existing_fields() {
        let mut hole = HoleStats::new(3, 4);
        hole.fairway_hit = Some(true);

        let mut update = HoleStats::new(3, 4);
        update.green_in_regulation = Some(true);
        hole.merge(&update);

        assert_eq!(hole.fairway_hit, Some(true));
        assert_eq!(hole.green_in_regulation, Some(true));
    }

    #[test]
    fn test_upsert_merges_by_hole_number() {
        let mut stats = RoundStats::new("1", "2026-01-01T00:00:00+00:00");
        let mut first = HoleStats::new(2, 3);
        first.putts = Some(2);
        stats.upsert_hole(first);

        let mut second = HoleStats::new(2, 3);
        second.score = Some(3);
        stats.upsert_hole(second);

        assert_eq!(stats.holes.len(), 1);
        let hole = stats.hole(2).unwrap();
        assert_eq!(hole.putts, Some(2));
        assert_eq!(hole.score, Some(3));
    }

    #[test]
    fn test_holes_serialize_as_list_in_append_order() {
        let mut stats = RoundStats::new("1", "2026-01-01T00:00:00+00:00");
        stats.upsert_hole(HoleStats::new(5, 5));
        stats.upsert_hole(HoleStats::new(1, 4));

        let json = serde_json::to_value(&stats).unwrap();
        let holes = json["holes"].as_array().unwrap();
        assert_eq!(holes.len(), 2);
        assert_eq!(holes[0]["holeNumber"], 5);
        assert_eq!(holes[1]["holeNumber"], 1);
    }

    #[test]
    fn test_duplicate_holes_fold_on_load() {
        let json = r#"{
            "roundId": "1",
            "date": "2026-01-01T00:00:00+00:00",
            "holes": [
                {"holeNumber": 1, "par": 4, "fairwayHit": true},
                {"holeNumber": 1, "par": 4, "putts": 2}
            ],
            "currentHole": 1
        }"#;
        let stats: RoundStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.holes.len(), 1);
        let hole = stats.hole(1).unwrap();
        assert_eq!(hole.fairway_hit, Some(true));
        assert_eq!(hole.putts, Some(2));
    }

    #[test]
    fn test_normalize_drops_orphans() {
        let mut data = GolfData::default();
        data.rounds.insert("1".to_string(), vec![Message::model("hi")]);
        data.round_stats
            .insert("1".to_string(), RoundStats::new("1", "d"));
        data.round_stats
            .insert("2".to_string(), RoundStats::new("2", "d"));
        data.current_round_id = Some("9".to_string());

        assert!(data.normalize());
        assert_eq!(data.round_stats.len(), 1);
        assert!(data.current_round_id.is_none());
        assert!(!data.normalize());
    }
}
