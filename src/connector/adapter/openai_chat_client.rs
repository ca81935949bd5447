use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::ChatClient;
use crate::domain::DomainError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for OpenAI-compatible chat completion endpoints.
///
/// Before each request the client sends a lightweight `HEAD /` probe with a
/// 2-second timeout, so an unreachable server fails fast instead of waiting
/// for the full request timeout.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    /// Cheap connectivity check with a short timeout.
    probe_client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    url: String,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let trimmed = base.trim_end_matches('/');
        let url = format!("{trimmed}{COMPLETIONS_PATH}");
        let base_url = format!("{trimmed}/");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            probe_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(2))
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            url,
            base_url,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Construct from environment variables:
    ///
    /// | Variable          | Default                  |
    /// |-------------------|--------------------------|
    /// | `OPENAI_API_KEY`  | none, returns `None`     |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com` |
    /// | `OPENAI_MODEL`    | `gpt-3.5-turbo`          |
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())?;
        let base =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        Some(Self::new(key, model, base))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, DomainError> {
        // Any HTTP response, even 4xx/5xx, means the server is up.
        match self.probe_client.head(&self.base_url).send().await {
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Err(DomainError::llm(format!(
                    "server not reachable at {}: {e}",
                    self.base_url.trim_end_matches('/')
                )));
            }
            _ => {}
        }

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ApiMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ApiMessage {
            role: "user",
            content: user,
        });

        let request = ApiRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::llm(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Chat completion API returned {status}: {body}");
            return Err(DomainError::llm(format!("API returned {status}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::llm(format!("failed to parse response: {e}")))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::llm("response contained no choices"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_is_built_from_base() {
        let client = OpenAiChatClient::new("key", "gpt-3.5-turbo", "http://localhost:1234/");
        assert_eq!(client.url(), "http://localhost:1234/v1/chat/completions");
        assert_eq!(client.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_fast() {
        let client = OpenAiChatClient::new("key", "m", "http://127.0.0.1:9");
        let err = client.complete("", "hello").await.unwrap_err();
        assert!(matches!(err, DomainError::LlmError(_)));
    }
}
