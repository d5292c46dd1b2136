//! Application services for the caddie.
//!
//! [`RoundSessionManager`] is the single owner of the golf data aggregate;
//! front ends drive it and render copies of its state.

pub mod round_session;

pub use round_session::{Clock, RoundSessionManager, TurnOutcome};
