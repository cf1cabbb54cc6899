//! Client for the media sidecar service.
//!
//! Speech synthesis, caption timing, and compositing run in a separate
//! media service on the same host; this client drives it over HTTP and
//! exchanges file paths on the shared filesystem.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use reel_models::{Interval, ResourceSegment, TimedCaption, VideoSettings};

use crate::error::{ProviderError, ProviderResult};
use crate::retry::{retry_provider_call, RetryConfig};
use crate::traits::{CaptionExtractor, SpeechSynthesizer, VideoRenderer};

/// Configuration for the media sidecar client.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Base URL of the media service.
    pub base_url: String,
    /// Request timeout; rendering can take minutes.
    pub timeout: Duration,
    /// Max retries for transient failures.
    pub max_retries: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8091".to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 2,
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MEDIA_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8091".to_string()),
            timeout: Duration::from_secs(
                std::env::var("MEDIA_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("MEDIA_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

#[derive(Debug, Deserialize)]
struct CaptionsResponse {
    captions: Vec<WireCaption>,
}

#[derive(Debug, Deserialize)]
struct WireCaption {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    audio_path: &'a str,
    captions: &'a [TimedCaption],
    segments: &'a [ResourceSegment],
    settings: &'a VideoSettings,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    output_path: String,
}

/// Client for the media sidecar.
pub struct MediaServiceClient {
    http: Client,
    config: MediaConfig,
}

impl MediaServiceClient {
    /// Create a new media client.
    pub fn new(config: MediaConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(MediaConfig::from_env())
    }

    fn path_str(path: &Path) -> ProviderResult<&str> {
        path.to_str()
            .ok_or_else(|| ProviderError::permanent("non-UTF-8 media path"))
    }
}

#[async_trait]
impl SpeechSynthesizer for MediaServiceClient {
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> ProviderResult<()> {
        let url = format!("{}/tts", self.config.base_url);
        info!(%voice, chars = text.len(), "synthesizing narration");

        let retry = RetryConfig::new("tts").with_max_retries(self.config.max_retries);
        let bytes = retry_provider_call(&retry, || async {
            let resp = self
                .http
                .post(&url)
                .json(&TtsRequest { text, voice })
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(status, &body));
            }
            resp.bytes()
                .await
                .map_err(|e| ProviderError::invalid_response(e.to_string()))
        })
        .await?;

        let mut file = tokio::fs::File::create(output)
            .await
            .map_err(|e| ProviderError::permanent(format!("cannot create audio file: {e}")))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| ProviderError::permanent(format!("cannot write audio file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| ProviderError::permanent(format!("cannot write audio file: {e}")))?;
        debug!(bytes = bytes.len(), path = %output.display(), "audio written");
        Ok(())
    }
}

#[async_trait]
impl CaptionExtractor for MediaServiceClient {
    async fn extract(&self, audio: &Path) -> ProviderResult<Vec<TimedCaption>> {
        let url = format!("{}/captions", self.config.base_url);
        let audio_path = Self::path_str(audio)?;

        let retry = RetryConfig::new("captions").with_max_retries(self.config.max_retries);
        let response: CaptionsResponse = retry_provider_call(&retry, || async {
            let resp = self
                .http
                .post(&url)
                .json(&serde_json::json!({ "audio_path": audio_path }))
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(status, &body));
            }
            resp.json()
                .await
                .map_err(|e| ProviderError::invalid_response(e.to_string()))
        })
        .await?;

        Ok(response
            .captions
            .into_iter()
            .map(|c| TimedCaption::new(Interval::new(c.start, c.end), c.text))
            .collect())
    }
}

#[async_trait]
impl VideoRenderer for MediaServiceClient {
    async fn render(
        &self,
        audio: &Path,
        captions: &[TimedCaption],
        segments: &[ResourceSegment],
        settings: &VideoSettings,
    ) -> ProviderResult<String> {
        let url = format!("{}/render", self.config.base_url);
        let audio_path = Self::path_str(audio)?;
        info!(segments = segments.len(), "requesting final render");

        let request = RenderRequest {
            audio_path,
            captions,
            segments,
            settings,
        };

        // Rendering is not retried: a second encode of a half-written
        // output is worse than failing the task.
        let resp = self.http.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }
        let parsed: RenderResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;
        Ok(parsed.output_path)
    }
}
