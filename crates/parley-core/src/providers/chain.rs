//! Ordered fallback across several providers.

use async_trait::async_trait;

use super::shared::{ProviderError, ProviderErrorKind, ProviderResult};
use super::ReplyProvider;
use crate::message::ContextMessage;

/// Tries each provider in order and returns the first reply.
pub struct FallbackChain {
    providers: Vec<Box<dyn ReplyProvider>>,
}

impl FallbackChain {
    pub fn new(providers: Vec<Box<dyn ReplyProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl ReplyProvider for FallbackChain {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn fetch_reply(
        &self,
        prompt: &str,
        context: &[ContextMessage],
    ) -> ProviderResult<String> {
        let mut failures = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.fetch_reply(prompt, context).await {
                Ok(reply) => {
                    tracing::info!(provider = provider.name(), "reply received");
                    return Ok(reply);
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), kind = %e.kind, "provider failed: {e}");
                    failures.push(format!("{}: {e}", provider.name()));
                }
            }
        }

        let message = if failures.is_empty() {
            "No reply providers configured".to_string()
        } else {
            format!("All providers failed ({})", failures.join("; "))
        };
        Err(ProviderError::new(ProviderErrorKind::Exhausted, message))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Scripted {
        name: &'static str,
        reply: ProviderResult<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ReplyProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_reply(&self, _: &str, _: &[ContextMessage]) -> ProviderResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn scripted(
        name: &'static str,
        reply: ProviderResult<String>,
    ) -> (Box<dyn ReplyProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Scripted {
            name,
            reply,
            calls: Arc::clone(&calls),
        };
        (Box::new(provider), calls)
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let (first, first_calls) = scripted(
            "first",
            Err(ProviderError::new(ProviderErrorKind::Timeout, "slow")),
        );
        let (second, second_calls) = scripted("second", Ok("hello".to_string()));
        let (third, third_calls) = scripted("third", Ok("unused".to_string()));

        let chain = FallbackChain::new(vec![first, second, third]);
        assert_eq!(chain.fetch_reply("hi", &[]).await.unwrap(), "hello");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failures_exhaust_chain() {
        let (a, _) = scripted(
            "a",
            Err(ProviderError::new(ProviderErrorKind::MissingApiKey, "no key")),
        );
        let (b, _) = scripted("b", Err(ProviderError::http_status(500, "")));
        let chain = FallbackChain::new(vec![a, b]);

        let err = chain.fetch_reply("hi", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Exhausted);
        assert!(err.message.contains("a: no key"));
        assert!(err.message.contains("b: HTTP 500"));
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = FallbackChain::new(Vec::new());
        let err = chain.fetch_reply("hi", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Exhausted);
    }
}
