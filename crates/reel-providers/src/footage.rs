//! Stock-footage search against a Pexels-style video API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use reel_models::ResourceRef;

use crate::error::{ProviderError, ProviderResult};
use crate::retry::{retry_provider_call, RetryConfig};
use crate::traits::FootageProvider;

/// Minimum accepted source resolution (landscape).
const MIN_WIDTH: u32 = 1920;
const MIN_HEIGHT: u32 = 1080;
/// Aspect ratio tolerance around 16:9.
const ASPECT_TOLERANCE: f64 = 0.1;
/// Preferred clip duration in seconds; hits are ranked by distance to it.
const TARGET_DURATION: f64 = 15.0;

/// Configuration for the footage client.
#[derive(Debug, Clone)]
pub struct FootageConfig {
    /// Base URL of the video search API.
    pub base_url: String,
    /// Provider API key, sent in the Authorization header.
    pub api_key: String,
    /// Results per query.
    pub per_page: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// Max retries for transient failures.
    pub max_retries: u32,
}

impl FootageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("PEXELS_KEY")
            .map_err(|_| ProviderError::permanent("PEXELS_KEY not set"))?;

        Ok(Self {
            base_url: std::env::var("PEXELS_BASE_URL")
                .unwrap_or_else(|_| "https://api.pexels.com/videos".to_string()),
            api_key,
            per_page: 15,
            timeout: Duration::from_secs(
                std::env::var("PEXELS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: std::env::var("PEXELS_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        })
    }
}

/// Search response wire types.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    link: String,
}

/// Client for a Pexels-style stock video API.
pub struct PexelsClient {
    http: Client,
    config: FootageConfig,
}

impl PexelsClient {
    /// Create a new footage client.
    pub fn new(config: FootageConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(FootageConfig::from_env()?)
    }

    async fn search_videos(&self, query: &str) -> ProviderResult<SearchResponse> {
        let url = format!("{}/search", self.config.base_url);
        let retry = RetryConfig::new("footage_search").with_max_retries(self.config.max_retries);

        retry_provider_call(&retry, || async {
            let resp = self
                .http
                .get(&url)
                .header("Authorization", &self.config.api_key)
                .query(&[
                    ("query", query),
                    ("orientation", "landscape"),
                    ("per_page", &self.config.per_page.to_string()),
                ])
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
        .await
    }

    /// Pick the best hit for one query: full-HD 16:9 sources, closest to
    /// the target duration, first file not already used.
    fn best_video(&self, response: SearchResponse, exclude: &[String]) -> Option<ResourceRef> {
        let mut candidates: Vec<Video> = response
            .videos
            .into_iter()
            .filter(|v| {
                v.width >= MIN_WIDTH
                    && v.height >= MIN_HEIGHT
                    && (v.width as f64 / v.height.max(1) as f64 - 16.0 / 9.0).abs()
                        < ASPECT_TOLERANCE
            })
            .collect();

        candidates.sort_by(|a, b| {
            let da = (a.duration - TARGET_DURATION).abs();
            let db = (b.duration - TARGET_DURATION).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

        for video in candidates {
            for file in &video.video_files {
                if file.width == Some(MIN_WIDTH) && file.height == Some(MIN_HEIGHT) {
                    let already_used = exclude.iter().any(|used| file.link.starts_with(used));
                    if !already_used {
                        return Some(ResourceRef::new(file.link.clone(), video.id.to_string()));
                    }
                }
            }
        }
        None
    }
}

/// Prefix under which a used asset URL excludes later re-use. Provider
/// CDNs vary the suffix per rendition, so compare up to the rendition
/// marker.
pub fn used_prefix(url: &str) -> String {
    url.split(".hd").next().unwrap_or(url).to_string()
}

#[async_trait]
impl FootageProvider for PexelsClient {
    async fn search(
        &self,
        keywords: &[String],
        exclude: &[String],
    ) -> ProviderResult<Option<ResourceRef>> {
        for query in keywords {
            if query.trim().len() < 2 {
                continue;
            }
            match self.search_videos(query).await {
                Ok(response) => {
                    if let Some(resource) = self.best_video(response, exclude) {
                        debug!(%query, id = %resource.provider_id, "footage matched");
                        return Ok(Some(resource));
                    }
                    debug!(%query, "no usable footage for query");
                }
                Err(e) if e.is_permanent() => return Err(e),
                Err(e) => {
                    // A flaky query should not sink the whole segment.
                    warn!(%query, %e, "footage query failed, trying next keyword");
                }
            }
        }
        Ok(None)
    }
}
