//! Chat collaborator configuration.
//!
//! The API key and model selection persist across runs in a small TOML
//! file. The `DEEPSEEK_API_KEY` environment variable always takes
//! precedence over the stored key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// DeepSeek API key; absent until configured.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Chat model: `deepseek-chat` (V3) or `deepseek-reasoner` (R1).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout for the chat API.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl ChatConfig {
    /// Read the config file without consulting the environment. A missing
    /// file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ChatConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        if config.model.trim().is_empty() {
            anyhow::bail!("model must not be empty");
        }
        Ok(config)
    }
}

/// Load the config, letting `DEEPSEEK_API_KEY` override the stored key.
pub fn load_config(path: &Path) -> Result<ChatConfig> {
    let mut config = ChatConfig::from_file(path)?;
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.api_key = Some(key);
        }
    }
    Ok(config)
}

/// Persist the config so the key and model survive restarts.
pub fn save_config(path: &Path, config: &ChatConfig) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the chat settings file.
pub fn default_config_path() -> PathBuf {
    home_dir().join(".cartographer.toml")
}

/// Default location of the recent-projects history file.
pub fn default_history_path() -> PathBuf {
    home_dir().join(".cartographer_history")
}
