//! Cohere v2 chat provider.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::shared::{
    ProviderError, ProviderResult, build_http_client, resolve_api_key, resolve_base_url,
    send_for_text,
};
use super::{ProviderKind, ReplyProvider};
use crate::config::Config;
use crate::message::{ContextMessage, Role};

pub const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

/// Cohere configuration.
#[derive(Debug, Clone)]
pub struct CohereConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_prompt: Option<String>,
}

impl CohereConfig {
    /// Resolves settings from `[providers.cohere]`, falling back to
    /// `COHERE_API_KEY` for the key and `model` for the model.
    pub fn from_config(config: &Config) -> Self {
        let settings = config.providers.settings(ProviderKind::Cohere);
        Self {
            api_key: resolve_api_key(
                settings.api_key.as_deref(),
                ProviderKind::Cohere.api_key_env_var(),
            ),
            base_url: resolve_base_url(settings.base_url.as_deref(), DEFAULT_BASE_URL),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            system_prompt: config.effective_system_prompt().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Cohere client.
pub struct CohereProvider {
    config: CohereConfig,
    http: reqwest::Client,
}

impl CohereProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: CohereConfig, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            config,
            http: build_http_client(timeout)?,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a str, context: &'a [ContextMessage]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        if let Some(system) = self.config.system_prompt.as_deref() {
            messages.push(ChatTurn {
                role: Role::System.as_str(),
                content: system,
            });
        }
        messages.extend(context.iter().map(|m| ChatTurn {
            role: m.role.as_str(),
            content: &m.content,
        }));
        messages.push(ChatTurn {
            role: Role::User.as_str(),
            content: prompt,
        });
        ChatRequest {
            model: &self.config.model,
            messages,
        }
    }
}

/// Joins the text parts of a v2 chat response.
fn parse_reply(body: &str) -> ProviderResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::parse(format!("Invalid Cohere response: {e}")))?;
    let Some(message) = response.message else {
        return Err(ProviderError::parse("Cohere response has no message"));
    };

    let text: String = message
        .content
        .into_iter()
        .filter(|c| c.kind.as_deref().is_none_or(|k| k == "text"))
        .filter_map(|c| c.text)
        .collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::empty_reply("cohere"));
    }
    Ok(text.to_string())
}

#[async_trait]
impl ReplyProvider for CohereProvider {
    fn name(&self) -> &str {
        ProviderKind::Cohere.id()
    }

    async fn fetch_reply(
        &self,
        prompt: &str,
        context: &[ContextMessage],
    ) -> ProviderResult<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ProviderError::missing_api_key(
                ProviderKind::Cohere.api_key_env_var(),
                ProviderKind::Cohere.id(),
            ));
        };

        let url = format!("{}/v2/chat", self.config.base_url);
        let request = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request(prompt, context));
        tracing::debug!(model = %self.config.model, "cohere request");

        let body = send_for_text(request).await?;
        parse_reply(&body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::providers::ProviderErrorKind;

    fn config_for(server: &MockServer, api_key: Option<&str>) -> CohereConfig {
        CohereConfig {
            api_key: api_key.map(str::to_string),
            base_url: server.uri(),
            model: "command-a-03-2025".to_string(),
            system_prompt: Some("Be brief.".to_string()),
        }
    }

    #[test]
    fn test_parse_reply_joins_text_parts() {
        let body = json!({
            "id": "x",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Hello "},
                    {"type": "text", "text": "there"}
                ]
            },
            "finish_reason": "COMPLETE"
        })
        .to_string();
        assert_eq!(parse_reply(&body).unwrap(), "Hello there");
    }

    #[test]
    fn test_parse_reply_empty_content() {
        let body = json!({"message": {"role": "assistant", "content": []}}).to_string();
        assert_eq!(
            parse_reply(&body).unwrap_err().kind,
            ProviderErrorKind::EmptyReply
        );
        assert_eq!(
            parse_reply("not json").unwrap_err().kind,
            ProviderErrorKind::Parse
        );
    }

    #[tokio::test]
    async fn test_fetch_reply_sends_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/chat"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "command-a-03-2025",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "earlier"},
                    {"role": "assistant", "content": "reply"},
                    {"role": "user", "content": "now"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": [{"type": "text", "text": "ok!"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = CohereProvider::new(config_for(&server, Some("test-key")), None).unwrap();
        let context = vec![
            ContextMessage::new(Role::User, "earlier"),
            ContextMessage::new(Role::Assistant, "reply"),
        ];
        let reply = provider.fetch_reply("now", &context).await.unwrap();
        assert_eq!(reply, "ok!");
    }

    #[tokio::test]
    async fn test_fetch_reply_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/chat"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "invalid api token"})),
            )
            .mount(&server)
            .await;

        let provider = CohereProvider::new(config_for(&server, Some("bad")), None).unwrap();
        let err = provider.fetch_reply("hi", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::HttpStatus);
        assert!(err.message.contains("invalid api token"));
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let server = MockServer::start().await;
        let provider = CohereProvider::new(config_for(&server, None), None).unwrap();
        let err = provider.fetch_reply("hi", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MissingApiKey);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"message": {"content": []}})),
            )
            .mount(&server)
            .await;

        let provider = CohereProvider::new(
            config_for(&server, Some("k")),
            Some(Duration::from_millis(50)),
        )
        .unwrap();
        let err = provider.fetch_reply("hi", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
    }
}
