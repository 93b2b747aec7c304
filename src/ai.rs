//! AI text generation for the `ai` command.
//!
//! Supports OpenAI, Anthropic Claude and Deepseek chat APIs.

use crate::error::{QuickfillError, Result};
use crate::models::{AiConfig, AiProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const CLAUDE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEEPSEEK_URL: &str = "https://api.deepseek.com/chat/completions";

const OPENAI_MODEL: &str = "gpt-4";
const CLAUDE_MODEL: &str = "claude-3-opus-20240229";
const DEEPSEEK_MODEL: &str = "deepseek-chat";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT_SECS: u64 = 60;

pub const AI_NOT_CONFIGURED: &str =
    "[Error: AI is not configured. Set an API key in the settings.]";
pub const AI_CALL_FAILED: &str = "[Error: could not generate an AI response. Please try again.]";

#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(&self, provider: AiProvider, api_key: &str, prompt: &str) -> Result<String>;
}

/// Run the `ai` command: never fails, errors become bracketed markers
pub async fn generate_or_marker(client: &dyn AiClient, config: &AiConfig, prompt: &str) -> String {
    let Some((provider, api_key)) = config.active() else {
        return AI_NOT_CONFIGURED.to_string();
    };

    match client.generate(provider, api_key, prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(%provider, "AI generation failed: {}", e);
            AI_CALL_FAILED.to_string()
        }
    }
}

#[derive(Clone)]
pub struct HttpAiClient {
    client: Client,
}

impl HttpAiClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    async fn chat_completions(&self, url: &str, model: &str, api_key: &str, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&serde_json::json!({
                "model": model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuickfillError::Ai(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let body: ChatCompletion = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| QuickfillError::Ai("empty completion".to_string()))
    }

    async fn claude_messages(&self, api_key: &str, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(CLAUDE_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": CLAUDE_MODEL,
                "max_tokens": MAX_TOKENS,
                "messages": [{"role": "user", "content": prompt}]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuickfillError::Ai(format!(
                "Claude API returned status {}",
                response.status()
            )));
        }

        let body: ClaudeMessage = response.json().await?;
        body.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| QuickfillError::Ai("empty response from Claude".to_string()))
    }
}

impl Default for HttpAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiClient for HttpAiClient {
    async fn generate(&self, provider: AiProvider, api_key: &str, prompt: &str) -> Result<String> {
        debug!(%provider, "requesting AI completion");
        match provider {
            AiProvider::OpenAi => {
                self.chat_completions(OPENAI_URL, OPENAI_MODEL, api_key, prompt)
                    .await
            }
            AiProvider::Claude => self.claude_messages(api_key, prompt).await,
            AiProvider::Deepseek => {
                self.chat_completions(DEEPSEEK_URL, DEEPSEEK_MODEL, api_key, prompt)
                    .await
            }
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ClaudeMessage {
    content: Vec<ClaudeBlock>,
}

#[derive(Deserialize)]
struct ClaudeBlock {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAi;

    #[async_trait]
    impl AiClient for EchoAi {
        async fn generate(&self, provider: AiProvider, _key: &str, prompt: &str) -> Result<String> {
            Ok(format!("{}:{}", provider, prompt))
        }
    }

    struct BrokenAi;

    #[async_trait]
    impl AiClient for BrokenAi {
        async fn generate(&self, _: AiProvider, _: &str, _: &str) -> Result<String> {
            Err(QuickfillError::Ai("boom".to_string()))
        }
    }

    fn configured() -> AiConfig {
        AiConfig {
            selected_provider: Some(AiProvider::Deepseek),
            deepseek_api_key: Some("key".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn unconfigured_provider_yields_marker() {
        let text = generate_or_marker(&EchoAi, &AiConfig::default(), "hi").await;
        assert_eq!(text, AI_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn configured_provider_is_called() {
        let text = generate_or_marker(&EchoAi, &configured(), "hi").await;
        assert_eq!(text, "deepseek:hi");
    }

    #[tokio::test]
    async fn failures_degrade_to_marker() {
        let text = generate_or_marker(&BrokenAi, &configured(), "hi").await;
        assert_eq!(text, AI_CALL_FAILED);
    }

    #[test]
    fn completion_payloads_parse() {
        let chat: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  hello \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(chat.choices[0].message.content.trim(), "hello");

        let claude: ClaudeMessage =
            serde_json::from_str(r#"{"content":[{"type":"text","text":"hey"}]}"#).unwrap();
        assert_eq!(claude.content[0].text.as_deref(), Some("hey"));
    }
}
