//! Round lifecycle operations on the `GolfData` aggregate.
//!
//! These are pure functions: each takes the aggregate by value (or by
//! reference for views) and returns the updated aggregate. Persisting the
//! result is the caller's job.

use super::message::Message;
use super::model::{GolfData, RoundStats};
use crate::error::{CaddieError, Result};
use chrono::{DateTime, Utc};

/// Greeting seeded into the very first round.
pub const FIRST_ROUND_GREETING: &str = "Hey, I'm your AI Caddie! I'll remember how you play to give you the best advice. What's the situation on your first hole?";

/// Greeting seeded into every later round.
pub const NEW_ROUND_GREETING: &str = "Alright, new round! I've got all your past shots in my memory. Let's get started. Tell me about the first hole.";

/// Reply appended when the model could not be reached.
pub const FALLBACK_REPLY: &str = "Sorry, I ran into a problem. Please try again.";

/// Allocates a round id derived from `now` (milliseconds since epoch).
///
/// The id is strictly greater than every numeric id already in `existing`,
/// so ids stay unique even if the clock stalls or goes backwards.
pub fn next_round_id(existing: Option<&GolfData>, now: DateTime<Utc>) -> String {
    let candidate = now.timestamp_millis();
    let latest = existing
        .into_iter()
        .flat_map(|data| data.rounds.keys())
        .filter_map(|id| id.parse::<i64>().ok())
        .max();

    match latest {
        Some(latest) if latest >= candidate => (latest + 1).to_string(),
        _ => candidate.to_string(),
    }
}

/// Starts a new round and makes it current.
///
/// With no existing data this is the first round ever and the result holds
/// only this round. Otherwise the round is added alongside prior rounds.
pub fn start_new_round(existing: Option<GolfData>, now: DateTime<Utc>) -> GolfData {
    let round_id = next_round_id(existing.as_ref(), now);
    let (mut data, greeting) = match existing {
        None => (GolfData::default(), FIRST_ROUND_GREETING),
        Some(data) => (data, NEW_ROUND_GREETING),
    };

    data.rounds
        .insert(round_id.clone(), vec![Message::model(greeting)]);
    data.round_stats
        .insert(round_id.clone(), RoundStats::new(round_id.clone(), now.to_rfc3339()));
    data.current_round_id = Some(round_id);
    data
}

/// Appends `message` to the log of `round_id`.
///
/// # Errors
///
/// Returns `InvalidRound` if the round does not exist. The aggregate is
/// consumed either way; callers keep their own copy when they need to
/// survive the error.
pub fn append_message(mut data: GolfData, round_id: &str, message: Message) -> Result<GolfData> {
    let log = data
        .rounds
        .get_mut(round_id)
        .ok_or_else(|| CaddieError::invalid_round(round_id))?;
    log.push(message);
    Ok(data)
}

/// Messages of the current round, or an empty slice without one.
pub fn current_messages(data: &GolfData) -> &[Message] {
    data.current_round_id
        .as_deref()
        .and_then(|id| data.messages(id))
        .unwrap_or(&[])
}

/// Every message of every round, rounds in creation order.
pub fn full_history(data: &GolfData) -> Vec<Message> {
    data.rounds.values().flatten().cloned().collect()
}

/// Applies `update` to the statistics of `round_id`.
///
/// Legacy rounds without statistics get an empty record first, dated now.
///
/// # Errors
///
/// Returns `InvalidRound` if the round does not exist.
pub fn update_round_stats<F>(
    mut data: GolfData,
    round_id: &str,
    now: DateTime<Utc>,
    update: F,
) -> Result<GolfData>
where
    F: FnOnce(&mut RoundStats),
{
    if !data.contains_round(round_id) {
        return Err(CaddieError::invalid_round(round_id));
    }

    let stats = data
        .round_stats
        .entry(round_id.to_string())
        .or_insert_with(|| RoundStats::new(round_id, now.to_rfc3339()));
    update(stats);
    Ok(data)
}
