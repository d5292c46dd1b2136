//! Round lifecycle and golfer turns.

mod manager;


pub use manager::{Clock, RoundSessionManager, TurnOutcome};
