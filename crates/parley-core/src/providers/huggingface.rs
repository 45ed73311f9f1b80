//! Hugging Face inference provider (TinyLlama chat template).

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::shared::{
    ProviderError, ProviderResult, build_http_client, resolve_api_key, resolve_base_url,
    send_for_text,
};
use super::{ProviderKind, ReplyProvider};
use crate::config::Config;
use crate::message::{ContextMessage, Role};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "TinyLlama/TinyLlama-1.1B-Chat-v1.0";

const MAX_NEW_TOKENS: u32 = 250;
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.95;

const END_OF_TEXT: &str = "<|endoftext|>";
const TEMPLATE_MARKERS: [&str; 4] = ["<|assistant|>", END_OF_TEXT, "<|user|>", "<|system|>"];

/// Hugging Face configuration.
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_prompt: Option<String>,
}

impl HuggingFaceConfig {
    /// Resolves settings from `[providers.huggingface]`, falling back to
    /// `HF_API_KEY` for the key.
    pub fn from_config(config: &Config) -> Self {
        let settings = config.providers.settings(ProviderKind::HuggingFace);
        Self {
            api_key: resolve_api_key(
                settings.api_key.as_deref(),
                ProviderKind::HuggingFace.api_key_env_var(),
            ),
            base_url: resolve_base_url(settings.base_url.as_deref(), DEFAULT_BASE_URL),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: config.effective_system_prompt().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: Option<String>,
}

/// Hugging Face client.
pub struct HuggingFaceProvider {
    config: HuggingFaceConfig,
    http: reqwest::Client,
}

impl HuggingFaceProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: HuggingFaceConfig, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            config,
            http: build_http_client(timeout)?,
        })
    }
}

/// Renders the conversation in the TinyLlama chat template, ending with an
/// open assistant turn.
fn build_prompt(system: Option<&str>, context: &[ContextMessage], prompt: &str) -> String {
    let mut out = String::new();
    if let Some(system) = system {
        push_turn(&mut out, Role::System, system);
    }
    for message in context {
        push_turn(&mut out, message.role, &message.content);
    }
    push_turn(&mut out, Role::User, prompt);
    out.push_str("<|assistant|>");
    out
}

fn push_turn(out: &mut String, role: Role, content: &str) {
    let _ = writeln!(out, "<|{}|>\n{content}{END_OF_TEXT}", role.as_str());
}

fn strip_template_markers(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in TEMPLATE_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.trim().to_string()
}

/// Accepts `[{generated_text}]`, a bare `{generated_text}` or `{error}`.
fn parse_reply(body: &str) -> ProviderResult<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::parse(format!("Invalid Hugging Face response: {e}")))?;

    if let Some(error) = value.get("error") {
        let message = error.as_str().map_or_else(|| error.to_string(), str::to_string);
        return Err(ProviderError::api_error(message));
    }

    let generation: Option<Generation> = match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ProviderError::parse(format!("Invalid Hugging Face response: {e}")))?,
        other @ Value::Object(_) => Some(
            serde_json::from_value(other)
                .map_err(|e| ProviderError::parse(format!("Invalid Hugging Face response: {e}")))?,
        ),
        _ => None,
    };

    let text = generation
        .and_then(|g| g.generated_text)
        .map(|t| strip_template_markers(&t))
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ProviderError::empty_reply("huggingface"));
    }
    Ok(text)
}

#[async_trait]
impl ReplyProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        ProviderKind::HuggingFace.id()
    }

    async fn fetch_reply(
        &self,
        prompt: &str,
        context: &[ContextMessage],
    ) -> ProviderResult<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ProviderError::missing_api_key(
                ProviderKind::HuggingFace.api_key_env_var(),
                ProviderKind::HuggingFace.id(),
            ));
        };

        let url = format!("{}/models/{}", self.config.base_url, self.config.model);
        let body = json!({
            "inputs": build_prompt(self.config.system_prompt.as_deref(), context, prompt),
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
                "do_sample": true,
                "return_full_text": false
            }
        });
        tracing::debug!(model = %self.config.model, "huggingface request");

        let text = send_for_text(self.http.post(&url).bearer_auth(api_key).json(&body)).await?;
        parse_reply(&text)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::providers::ProviderErrorKind;

    #[test]
    fn test_prompt_template() {
        let prompt = build_prompt(
            Some("Help with code."),
            &[ContextMessage::new(Role::Assistant, "Earlier answer")],
            "What is a slice?",
        );
        assert_eq!(
            prompt,
            "<|system|>\nHelp with code.<|endoftext|>\n\
             <|assistant|>\nEarlier answer<|endoftext|>\n\
             <|user|>\nWhat is a slice?<|endoftext|>\n\
             <|assistant|>"
        );
    }

    #[test]
    fn test_parse_strips_markers() {
        let body = r#"[{"generated_text":"<|assistant|>\nA slice is a view.<|endoftext|><|user|>"}]"#;
        assert_eq!(parse_reply(body).unwrap(), "A slice is a view.");
    }

    #[test]
    fn test_parse_error_and_empty() {
        let err = parse_reply(r#"{"error":"Model is loading"}"#).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ApiError);
        assert_eq!(err.message, "Model is loading");

        let err = parse_reply(r#"[{"generated_text":"<|endoftext|>  "}]"#).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::EmptyReply);
        assert_eq!(parse_reply("[]").unwrap_err().kind, ProviderErrorKind::EmptyReply);
    }

    #[tokio::test]
    async fn test_fetch_reply_posts_to_model_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/TinyLlama/TinyLlama-1.1B-Chat-v1.0"))
            .and(body_partial_json(json!({
                "parameters": {"max_new_tokens": 250, "return_full_text": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"generated_text": "Use iterators."}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = HuggingFaceProvider::new(
            HuggingFaceConfig {
                api_key: Some("hf-key".to_string()),
                base_url: server.uri(),
                model: DEFAULT_MODEL.to_string(),
                system_prompt: None,
            },
            None,
        )
        .unwrap();
        assert_eq!(
            provider.fetch_reply("How?", &[]).await.unwrap(),
            "Use iterators."
        );
    }
}
