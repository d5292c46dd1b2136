//! Unified path management for caddie files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/caddie/                   # Config directory
//! └── config.toml                     # Application configuration
//!
//! ~/.local/share/caddie/              # Data directory
//! ├── golfCaddieHistory_v2.json       # The persisted GolfData record
//! └── logs/                           # Application logs
//!     └── caddie.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "caddie";

/// Versioned key of the persisted GolfData record.
pub const GOLF_DATA_KEY: &str = "golfCaddieHistory_v2";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for caddie.
pub struct CaddiePaths;

impl CaddiePaths {
    /// Returns the configuration directory (e.g. `~/.config/caddie/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/caddie/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the file storing the GolfData record under `data_dir`.
    pub fn golf_data_file(data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{GOLF_DATA_KEY}.json"))
    }

    /// Returns the log directory under `data_dir`.
    pub fn logs_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golf_data_file_uses_versioned_key() {
        let path = CaddiePaths::golf_data_file(Path::new("/tmp/caddie"));
        assert_eq!(path, PathBuf::from("/tmp/caddie/golfCaddieHistory_v2.json"));
    }

    #[test]
    fn test_logs_dir() {
        let path = CaddiePaths::logs_dir(Path::new("/tmp/caddie"));
        assert!(path.ends_with("logs"));
    }
}
