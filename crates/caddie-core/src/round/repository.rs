//! GolfData repository trait.
//!
//! Defines the interface for persisting the single `GolfData` record.

use super::model::GolfData;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for the `GolfData` aggregate.
///
/// This trait decouples the round logic from the storage mechanism
/// (JSON file, browser-style key/value store, in-memory).
///
/// # Implementation Notes
///
/// Implementations should:
/// - Treat an unparseable payload as absent, discarding it (never fatal)
/// - Accept legacy payloads that lack `roundStats`
/// - Make `save` atomic: a later `load` never observes a partial write
#[async_trait]
pub trait GolfDataRepository: Send + Sync {
    /// Loads the stored aggregate.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(GolfData))`: Record found and parsed
    /// - `Ok(None)`: Nothing stored, or the payload was corrupt and discarded
    /// - `Err(_)`: The store itself could not be accessed
    async fn load(&self) -> Result<Option<GolfData>>;

    /// Replaces the stored aggregate with `data`.
    async fn save(&self, data: &GolfData) -> Result<()>;

    /// Removes the stored aggregate.
    async fn clear(&self) -> Result<()>;
}
