//! Configuration management for Parley.
//!
//! Loads configuration from ${PARLEY_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::providers::ProviderKind;

pub mod paths {
    //! Path resolution for Parley configuration and data directories.
    //!
    //! PARLEY_HOME resolution order:
    //! 1. PARLEY_HOME environment variable (if set)
    //! 2. ~/.config/parley (default)

    use std::path::PathBuf;

    /// Returns the Parley home directory.
    ///
    /// Checks PARLEY_HOME env var first, falls back to ~/.config/parley.
    /// Without a resolvable home directory the current directory is used.
    pub fn parley_home() -> PathBuf {
        if let Ok(home) = std::env::var("PARLEY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".parley"),
            |h| h.join(".config").join("parley"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        parley_home().join("config.toml")
    }

    /// Returns the path to the conversations directory.
    pub fn conversations_dir() -> PathBuf {
        parley_home().join("conversations")
    }

    /// Returns the path to the log directory.
    pub fn logs_dir() -> PathBuf {
        parley_home().join("logs")
    }
}

/// Settings for a single reply provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL override (no trailing slash).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Inline API key; the provider's env var is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model override for providers that are not driven by `Config::model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Provider configuration (fallback order and per-provider settings).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Providers tried in order until one produces a reply.
    pub order: Vec<String>,
    pub cohere: ProviderSettings,
    pub huggingface: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            order: vec![
                ProviderKind::Cohere.id().to_string(),
                ProviderKind::HuggingFace.id().to_string(),
            ],
            cohere: ProviderSettings::default(),
            huggingface: ProviderSettings::default(),
        }
    }
}

impl ProvidersConfig {
    /// Returns the settings block for a provider.
    pub fn settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Cohere => &self.cohere,
            ProviderKind::HuggingFace => &self.huggingface,
        }
    }

    /// Resolves the configured fallback order into provider kinds.
    ///
    /// # Errors
    /// Returns an error for unknown provider ids or an empty order.
    pub fn resolved_order(&self) -> Result<Vec<ProviderKind>> {
        let mut kinds = Vec::with_capacity(self.order.len());
        for id in &self.order {
            let Some(kind) = ProviderKind::from_id(id) else {
                bail!("Unknown provider '{id}' in providers.order");
            };
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            bail!("providers.order must name at least one provider");
        }
        Ok(kinds)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat model used by the Cohere provider
    pub model: String,

    /// System prompt sent ahead of the conversation
    pub system_prompt: Option<String>,

    /// Timeout for a single provider request in seconds (0 disables)
    pub request_timeout_secs: u64,

    /// Animate assistant replies with the typewriter effect
    pub typewriter: bool,

    /// Provider configuration (fallback order, base URLs, keys).
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            system_prompt: Some(Self::DEFAULT_SYSTEM_PROMPT.to_string()),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            typewriter: true,
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_MODEL: &str = "command-a-03-2025";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a coding assistant. You only answer questions related to programming, software development, web technologies, and technical topics. For non-coding questions, politely explain that you're designed to help specifically with development and coding topics. Be concise and helpful in your explanations, and provide code examples when appropriate.";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template if no config file exists.
    ///
    /// Returns `true` if a file was created.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(true)
    }

    /// Returns the trimmed system prompt, if any.
    pub fn effective_system_prompt(&self) -> Option<&str> {
        let trimmed = self.system_prompt.as_deref().unwrap_or("").trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }
}

/// Returns the commented template written by `parley config init`.
pub fn default_config_template() -> &'static str {
    r#"# Parley configuration

# Chat model for the Cohere provider
model = "command-a-03-2025"

# Seconds before a provider request is abandoned (0 disables)
request_timeout_secs = 60

# Reveal assistant replies with the typing animation
typewriter = true

[providers]
# Providers are tried in order until one replies
order = ["cohere", "huggingface"]

[providers.cohere]
# base_url = "https://api.cohere.com"
# api_key = "..."   # defaults to $COHERE_API_KEY

[providers.huggingface]
# base_url = "https://api-inference.huggingface.co"
# model = "TinyLlama/TinyLlama-1.1B-Chat-v1.0"
# api_key = "..."   # defaults to $HF_API_KEY
"#
}
