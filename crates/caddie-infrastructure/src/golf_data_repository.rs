//! GolfData repository implementations.
//!
//! `JsonGolfDataRepository` keeps the aggregate in a single JSON file named
//! after the versioned storage key. `InMemoryGolfDataRepository` keeps it
//! in memory (tests, ephemeral sessions).

use crate::paths::CaddiePaths;
use crate::storage::{AtomicJsonError, AtomicJsonFile};
use async_trait::async_trait;
use caddie_core::error::{CaddieError, Result};
use caddie_core::round::{GolfData, GolfDataRepository};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// File-backed GolfData store.
///
/// Corrupt payloads are discarded on load and reported as absent, so the
/// caller falls back to first-run state.
pub struct JsonGolfDataRepository {
    file: Mutex<AtomicJsonFile<GolfData>>,
}

impl JsonGolfDataRepository {
    /// Creates a repository storing its record under `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_file(CaddiePaths::golf_data_file(data_dir))
    }

    /// Creates a repository backed by an explicit file path.
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            file: Mutex::new(AtomicJsonFile::new(path)),
        }
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn to_caddie_error(err: AtomicJsonError) -> CaddieError {
    match err {
        AtomicJsonError::Io(e) => e.into(),
        AtomicJsonError::Parse(e) => CaddieError::StorageCorrupt(e.to_string()),
        AtomicJsonError::Serialize(e) => e.into(),
        AtomicJsonError::Lock(msg) => CaddieError::io(msg),
    }
}

#[async_trait]
impl GolfDataRepository for JsonGolfDataRepository {
    async fn load(&self) -> Result<Option<GolfData>> {
        let file = self.file.lock().await;

        match file.load() {
            Ok(Some(mut data)) => {
                if data.normalize() {
                    tracing::warn!(
                        "[Store] Repaired inconsistent GolfData in {}",
                        file.path().display()
                    );
                }
                tracing::debug!("[Store] Loaded {} rounds", data.rounds.len());
                Ok(Some(data))
            }
            Ok(None) => Ok(None),
            Err(AtomicJsonError::Parse(e)) => {
                tracing::warn!(
                    "[Store] Discarding corrupt GolfData at {}: {}",
                    file.path().display(),
                    e
                );
                file.remove().map_err(to_caddie_error)?;
                Ok(None)
            }
            Err(e) => Err(to_caddie_error(e)),
        }
    }

    async fn save(&self, data: &GolfData) -> Result<()> {
        let file = self.file.lock().await;
        Self::ensure_parent(file.path())?;
        file.save(data).map_err(to_caddie_error)?;
        tracing::trace!("[Store] Saved {} rounds", data.rounds.len());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let file = self.file.lock().await;
        file.remove().map_err(to_caddie_error)?;
        tracing::info!("[Store] Cleared stored GolfData");
        Ok(())
    }
}

/// In-memory GolfData store.
#[derive(Default)]
pub struct InMemoryGolfDataRepository {
    data: Mutex<Option<GolfData>>,
}

impl InMemoryGolfDataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `data`.
    pub fn with_data(data: GolfData) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }
}

#[async_trait]
impl GolfDataRepository for InMemoryGolfDataRepository {
    async fn load(&self) -> Result<Option<GolfData>> {
        Ok(self.data.lock().await.clone())
    }

    async fn save(&self, data: &GolfData) -> Result<()> {
        *self.data.lock().await = Some(data.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.data.lock().await = None;
        Ok(())
    }
}
