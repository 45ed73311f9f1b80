//! Reply providers.
//!
//! A provider turns a prompt plus prior conversation context into one
//! complete reply string. Providers are combined into a [`FallbackChain`]
//! that tries them in the configured order.

pub mod chain;
pub mod cohere;
pub mod huggingface;
pub mod shared;

use anyhow::Result;
use async_trait::async_trait;

pub use chain::FallbackChain;
pub use shared::{ProviderError, ProviderErrorKind, ProviderResult};

use crate::config::Config;
use crate::message::ContextMessage;

/// A backend that produces a complete reply for a prompt.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Fetches one reply. `context` holds the earlier conversation turns,
    /// not including `prompt`.
    async fn fetch_reply(&self, prompt: &str, context: &[ContextMessage])
    -> ProviderResult<String>;
}

/// Known provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Cohere,
    HuggingFace,
}

impl ProviderKind {
    /// Returns all provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::Cohere, ProviderKind::HuggingFace]
    }

    /// Returns the string identifier used in config files.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Cohere => "cohere",
            ProviderKind::HuggingFace => "huggingface",
        }
    }

    /// Returns the ProviderKind for a given id string.
    pub fn from_id(id: &str) -> Option<ProviderKind> {
        match id.trim().to_lowercase().as_str() {
            "cohere" => Some(ProviderKind::Cohere),
            "huggingface" | "hf" => Some(ProviderKind::HuggingFace),
            _ => None,
        }
    }

    /// Returns the human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Cohere => "Cohere",
            ProviderKind::HuggingFace => "Hugging Face",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::Cohere => "COHERE_API_KEY",
            ProviderKind::HuggingFace => "HF_API_KEY",
        }
    }
}

/// Builds one provider from config.
///
/// # Errors
/// Returns an error if the HTTP client cannot be created.
pub fn build_provider(kind: ProviderKind, config: &Config) -> Result<Box<dyn ReplyProvider>> {
    let timeout = config.request_timeout();
    Ok(match kind {
        ProviderKind::Cohere => Box::new(cohere::CohereProvider::new(
            cohere::CohereConfig::from_config(config),
            timeout,
        )?),
        ProviderKind::HuggingFace => Box::new(huggingface::HuggingFaceProvider::new(
            huggingface::HuggingFaceConfig::from_config(config),
            timeout,
        )?),
    })
}

/// Builds the fallback chain in `providers.order`.
///
/// # Errors
/// Returns an error for an invalid provider order or client setup failure.
pub fn build_chain(config: &Config) -> Result<FallbackChain> {
    let providers = config
        .providers
        .resolved_order()?
        .into_iter()
        .map(|kind| build_provider(kind, config))
        .collect::<Result<Vec<_>>>()?;
    Ok(FallbackChain::new(providers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ids_round_trip() {
        for kind in ProviderKind::all() {
            assert_eq!(ProviderKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(ProviderKind::from_id(" HF "), Some(ProviderKind::HuggingFace));
        assert_eq!(ProviderKind::from_id("openai"), None);
    }

    #[test]
    fn test_build_chain_follows_order() {
        let mut config = Config::default();
        config.providers.order = vec!["huggingface".to_string(), "cohere".to_string()];
        let chain = build_chain(&config).unwrap();
        assert_eq!(chain.provider_names(), vec!["huggingface", "cohere"]);
    }
}
