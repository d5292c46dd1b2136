//! Caddie core domain.
//!
//! Round bookkeeping, scorecard extraction, the chat bridge contract and the
//! speech/photo contracts shared by the infrastructure and application
//! crates.

pub mod chat;
pub mod config;
pub mod error;
pub mod media;
pub mod round;
pub mod scorecard;
pub mod speech;

// Re-export common error type
pub use error::{CaddieError, Result};
