//! Collaborator interfaces consumed by the pipeline.
//!
//! The orchestrator depends only on these traits; the HTTP clients in this
//! crate implement them, and pipeline tests substitute in-memory fakes.

use std::path::Path;

use async_trait::async_trait;
use reel_models::{Language, ResourceRef, ResourceSegment, TimedCaption, VideoSettings};

use crate::error::ProviderResult;

/// Generative text collaborator: script, keywords, and self-correction.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Write a short narration script for the topic.
    async fn generate_script(&self, topic: &str, language: Language) -> ProviderResult<String>;

    /// Ask for timed search keywords. The return value is raw, untrusted
    /// text; the segment-recovery engine deals with its shape.
    async fn generate_keywords_raw(
        &self,
        script: &str,
        captions: &[TimedCaption],
        language: Language,
    ) -> ProviderResult<String>;

    /// Re-submit malformed keyword output with a reformat instruction.
    async fn reformat_segments(&self, malformed: &str) -> ProviderResult<String>;
}

/// Text-to-speech collaborator.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration into the audio file at `output`.
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> ProviderResult<()>;
}

/// Speech-to-text timing collaborator.
#[async_trait]
pub trait CaptionExtractor: Send + Sync {
    /// Extract word/phrase timings from a narration audio file.
    async fn extract(&self, audio: &Path) -> ProviderResult<Vec<TimedCaption>>;
}

/// Stock-footage search collaborator.
#[async_trait]
pub trait FootageProvider: Send + Sync {
    /// Find an asset for any of the given keywords, skipping assets whose
    /// URL starts with one of `exclude`. `None` means no match — that is
    /// a data point for the interval merger, not an error.
    async fn search(
        &self,
        keywords: &[String],
        exclude: &[String],
    ) -> ProviderResult<Option<ResourceRef>>;
}

/// Compositing/encoding collaborator.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Composite footage, captions, and narration into the final video.
    /// Returns a reference (path or URL) to the output.
    async fn render(
        &self,
        audio: &Path,
        captions: &[TimedCaption],
        segments: &[ResourceSegment],
        settings: &VideoSettings,
    ) -> ProviderResult<String>;
}
