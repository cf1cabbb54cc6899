//! OpenAI-compatible chat-completions client for script and keyword
//! generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reel_models::{Language, TimedCaption};

use crate::error::{ProviderError, ProviderResult};
use crate::prompts;
use crate::retry::{retry_provider_call, RetryConfig};
use crate::traits::ScriptGenerator;

/// Configuration for the LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (e.g. OpenRouter).
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Max retries for transient failures.
    pub max_retries: u32,
}

impl LlmConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ProviderError::permanent("OPENROUTER_API_KEY not set"))?;

        Ok(Self {
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            api_key,
            model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| "google/gemini-2.0-flash-exp:free".to_string()),
            timeout: Duration::from_secs(
                std::env::var("LLM_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("LLM_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        })
    }
}

/// Chat-completions request/response wire types.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat API.
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client.
    pub fn new(config: LlmConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(LlmConfig::from_env()?)
    }

    /// Send one chat exchange and return the assistant text, with
    /// whitespace runs collapsed.
    async fn chat(&self, system: &str, user: &str) -> ProviderResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: 1.0,
        };

        let retry = RetryConfig::new("llm_chat").with_max_retries(self.config.max_retries);
        let response = retry_provider_call(&retry, || async {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(status, &body));
            }
            let parsed: ChatResponse = resp
                .json()
                .await
                .map_err(|e| ProviderError::invalid_response(e.to_string()))?;
            Ok(parsed)
        })
        .await?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| ProviderError::invalid_response("no choices in chat response"))?;

        debug!(chars = content.len(), "llm reply received");
        Ok(content.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Pull the `script` field out of the model reply, tolerating surrounding
/// prose by falling back to the substring between the first `{` and the
/// last `}`.
fn extract_script(content: &str) -> ProviderResult<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(content) {
        if let Some(script) = value.get("script").and_then(|s| s.as_str()) {
            return Ok(script.to_string());
        }
    }

    let start = content.find('{');
    let end = content.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content[start..=end]) {
                if let Some(script) = value.get("script").and_then(|s| s.as_str()) {
                    return Ok(script.to_string());
                }
            }
        }
    }

    Err(ProviderError::invalid_response(
        "script response carried no parsable 'script' object",
    ))
}

fn captions_digest(captions: &[TimedCaption]) -> String {
    captions
        .iter()
        .map(|c| {
            format!(
                "(({:.2}, {:.2}), '{}')",
                c.interval.start, c.interval.end, c.text
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
impl ScriptGenerator for LlmClient {
    async fn generate_script(&self, topic: &str, language: Language) -> ProviderResult<String> {
        info!(%language, "generating script");
        let content = self.chat(prompts::script_system(language), topic).await?;
        extract_script(&content)
    }

    async fn generate_keywords_raw(
        &self,
        script: &str,
        captions: &[TimedCaption],
        language: Language,
    ) -> ProviderResult<String> {
        info!(%language, captions = captions.len(), "generating timed keywords");
        let user = format!(
            "Script: {}\nTimed Captions: {}",
            script,
            captions_digest(captions)
        );
        self.chat(prompts::keywords_system(language), &user).await
    }

    async fn reformat_segments(&self, malformed: &str) -> ProviderResult<String> {
        info!("asking model to reformat malformed segment output");
        self.chat(prompts::reformat_system(), malformed).await
    }
}
