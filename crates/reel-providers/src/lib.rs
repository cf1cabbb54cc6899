//! External collaborator clients for the ReelGen pipeline.
//!
//! Every stage the pipeline delegates — script generation, speech
//! synthesis, caption timing, footage search, rendering — is reached
//! through a trait in [`traits`], so the orchestrator can be tested with
//! in-memory fakes. The concrete implementations here are thin HTTP
//! clients: an OpenAI-compatible chat API for text generation, a
//! Pexels-style API for stock footage, and a media sidecar service for
//! TTS, caption timing, and compositing.

pub mod error;
pub mod footage;
pub mod llm;
pub mod media;
pub mod prompts;
pub mod retry;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use footage::{FootageConfig, PexelsClient};
pub use llm::{LlmClient, LlmConfig};
pub use media::{MediaConfig, MediaServiceClient};
pub use retry::{retry_provider_call, RetryConfig};
pub use traits::{
    CaptionExtractor, FootageProvider, ScriptGenerator, SpeechSynthesizer, VideoRenderer,
};
