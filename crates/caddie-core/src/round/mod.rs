//! Round domain module.
//!
//! This module contains the `GolfData` aggregate, its message and statistics
//! types, the pure round lifecycle operations and the screen state machine.
//!
//! # Module Structure
//!
//! - `message`: Conversation turn types (`Role`, `Message`, `ImageAttachment`)
//! - `model`: Aggregate types (`GolfData`, `RoundStats`, `HoleStats`)
//! - `manager`: Round lifecycle operations (`start_new_round`, `append_message`, ...)
//! - `repository`: Repository trait for aggregate persistence
//! - `screen`: Screen state machine (`Screen`, `ScreenEvent`)

pub mod manager;
mod message;
mod model;
mod repository;
mod screen;

// Re-export public API
pub use manager::{
    FALLBACK_REPLY, FIRST_ROUND_GREETING, NEW_ROUND_GREETING, append_message, current_messages,
    full_history, next_round_id, start_new_round, update_round_stats,
};
pub use message::{ImageAttachment, Message, Role};
pub use model::{DEFAULT_PAR, FIRST_HOLE, GolfData, HoleStats, MAX_HOLE_STROKES, RoundStats};
pub use repository::GolfDataRepository;
pub use screen::{Screen, ScreenEvent};
