use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Root of `config.toml`. Every section and field is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CaddieConfig {
    pub gemini: GeminiConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    /// Falls back to the `GEMINI_API_KEY` / `API_KEY` environment variables.
    pub api_key: Option<String>,
    /// Overrides the REST endpoint base (testing, proxies).
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak replies aloud.
    pub enabled: bool,
    /// Text-to-speech program, invoked with the reply as its last argument
    /// (e.g. `say` or `espeak`).
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}
