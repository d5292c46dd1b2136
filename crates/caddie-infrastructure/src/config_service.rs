//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/caddie/config.toml` and
//! resolves values that may come from the environment.

use crate::paths::CaddiePaths;
use caddie_core::config::CaddieConfig;
use caddie_core::error::{CaddieError, Result};
use std::path::{Path, PathBuf};

/// Environment variables consulted for the Gemini API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Loads and resolves the caddie configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    config: CaddieConfig,
}

impl ConfigService {
    /// Loads `config.toml` from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        let path = CaddiePaths::config_file().map_err(|e| CaddieError::config(e.to_string()))?;
        Self::load_from(&path)
    }

    /// Loads the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the file exists but is not valid
    /// TOML for [`CaddieConfig`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[Config] No config at {}, using defaults", path.display());
                CaddieConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { config })
    }

    pub fn from_config(config: CaddieConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CaddieConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CaddieConfig {
        &mut self.config
    }

    /// Resolves the Gemini API key from the config file, then the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if no key is available.
    pub fn api_key(&self) -> Result<String> {
        self.resolve_api_key(|name| std::env::var(name).ok())
    }

    fn resolve_api_key<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.config
            .gemini
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|name| lookup(name).filter(|key| !key.trim().is_empty()))
            })
            .ok_or_else(|| {
                CaddieError::config(format!(
                    "Gemini API key not set. Add [gemini] api_key to config.toml or set {}",
                    API_KEY_ENV_VARS.join(" or ")
                ))
            })
    }

    /// Directory holding the GolfData record and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.config.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => CaddiePaths::data_dir().map_err(|e| CaddieError::config(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caddie_core::config::DEFAULT_GEMINI_MODEL;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(service.config(), &CaddieConfig::default());
        assert_eq!(service.config().gemini.model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[speech]\nenabled = true\ncommand = \"say\"\n\n[storage]\ndata_dir = \"/tmp/golf\"\n",
        )
        .unwrap();

        let service = ConfigService::load_from(&path).unwrap();
        assert!(service.config().speech.enabled);
        assert_eq!(service.config().speech.command.as_deref(), Some("say"));
        assert_eq!(service.config().gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(service.data_dir().unwrap(), PathBuf::from("/tmp/golf"));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gemini\nmodel = 3").unwrap();
        assert!(ConfigService::load_from(&path).is_err());
    }

    #[test]
    fn test_api_key_precedence() {
        let mut config = CaddieConfig::default();
        config.gemini.api_key = Some("from-file".to_string());
        let service = ConfigService::from_config(config);
        let key = service
            .resolve_api_key(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(key, "from-file");

        let service = ConfigService::from_config(CaddieConfig::default());
        let key = service
            .resolve_api_key(|name| (name == "API_KEY").then(|| "legacy".to_string()))
            .unwrap();
        assert_eq!(key, "legacy");

        assert!(service.resolve_api_key(|_| None).unwrap_err().to_string().contains("API key"));
    }
}
