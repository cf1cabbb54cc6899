//! The six-stage generation pipeline and its state machine.

use std::sync::Arc;

use metrics::counter;
use tracing::{error, info, warn};

use reel_models::{
    KeywordSegment, ResourceSegment, Task, TaskId, TaskResult, VideoSettings,
};
use reel_providers::footage::used_prefix;
use reel_providers::{
    CaptionExtractor, FootageProvider, ProviderError, ScriptGenerator, SpeechSynthesizer,
    VideoRenderer,
};
use reel_segments::merge_absences;

use crate::error::{WorkerError, WorkerResult};
use crate::keywords::generate_keyword_segments;
use crate::store::TaskStore;

/// Progress band (start, end) owned by each pipeline stage.
mod bands {
    pub const SCRIPT: (u8, u8) = (0, 10);
    pub const AUDIO: (u8, u8) = (10, 30);
    pub const CAPTIONS: (u8, u8) = (30, 50);
    pub const KEYWORDS: (u8, u8) = (50, 70);
    pub const FOOTAGE: (u8, u8) = (70, 85);
    pub const RENDER: (u8, u8) = (85, 100);
}

/// The external collaborators every stage delegates to.
pub struct Collaborators {
    pub llm: Arc<dyn ScriptGenerator>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    pub captions: Arc<dyn CaptionExtractor>,
    pub footage: Arc<dyn FootageProvider>,
    pub renderer: Arc<dyn VideoRenderer>,
}

/// Runs submitted tasks, one tokio task each, against the shared store.
#[derive(Clone)]
pub struct Pipeline {
    store: TaskStore,
    collaborators: Arc<Collaborators>,
}

impl Pipeline {
    pub fn new(store: TaskStore, collaborators: Arc<Collaborators>) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Register a task and start its worker.
    pub fn submit(&self, task: Task) -> TaskId {
        let id = task.id.clone();
        info!(task_id = %id, topic = %task.topic, "task submitted");
        self.store.insert(task);

        let pipeline = self.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            pipeline.run(task_id).await;
        });
        id
    }

    /// Execute the pipeline for one task and settle its terminal state.
    pub async fn run(&self, id: TaskId) {
        let Some(task) = self.store.get(&id) else {
            warn!(task_id = %id, "task vanished before its worker started");
            return;
        };

        self.store.with_task(&id, |t| t.start());

        match self.execute(&id, &task.topic, &task.settings).await {
            Ok(video_path) => {
                info!(task_id = %id, %video_path, "task completed");
                self.store
                    .with_task(&id, |t| t.complete(TaskResult { video_path }));
                counter!("reel_tasks_completed_total").increment(1);
            }
            Err(WorkerError::Cancelled) => {
                // The checkpoint already moved the task to cancelled.
                info!(task_id = %id, "task cancelled at a checkpoint");
                counter!("reel_tasks_cancelled_total").increment(1);
            }
            Err(e) => {
                error!(task_id = %id, error = %e, "task failed");
                let descriptor = e.into_task_error();
                self.store.with_task(&id, |t| t.fail(descriptor));
                counter!("reel_tasks_failed_total").increment(1);
            }
        }
    }

    /// The stage sequence. The scratch dir is dropped on every exit path
    /// (success, cancellation, failure), which removes the TTS audio file.
    async fn execute(
        &self,
        id: &TaskId,
        topic: &str,
        settings: &VideoSettings,
    ) -> WorkerResult<String> {
        let c = &self.collaborators;
        let scratch = tempfile::tempdir()?;
        let audio_path = scratch.path().join(format!("audio_tts_{id}.wav"));

        self.checkpoint(id)?;
        self.progress(id, bands::SCRIPT.0, "Generating script...");
        let script = c.llm.generate_script(topic, settings.language).await?;
        self.progress(id, bands::SCRIPT.1, "Script generated");

        self.checkpoint(id)?;
        self.progress(id, bands::AUDIO.0, "Script generated. Creating audio...");
        c.tts.synthesize(&script, &settings.voice, &audio_path).await?;
        self.progress(id, bands::AUDIO.1, "Audio generated");

        self.checkpoint(id)?;
        self.progress(id, bands::CAPTIONS.0, "Audio generated. Creating captions...");
        let captions = c.captions.extract(&audio_path).await?;
        let total_duration = captions.last().map(|c| c.interval.end).ok_or_else(|| {
            WorkerError::Provider(ProviderError::invalid_response(
                "caption extractor returned no captions",
            ))
        })?;
        self.progress(id, bands::CAPTIONS.1, "Captions created");

        self.checkpoint(id)?;
        self.progress(
            id,
            bands::KEYWORDS.0,
            "Captions created. Generating video search terms...",
        );
        let segments = generate_keyword_segments(
            c.llm.as_ref(),
            &script,
            &captions,
            settings.language,
            total_duration,
        )
        .await?;
        self.progress(id, bands::KEYWORDS.1, "Search terms generated");

        self.checkpoint(id)?;
        self.progress(id, bands::FOOTAGE.0, "Searching for background videos...");
        let resources = self.resolve_footage(&segments).await?;
        self.progress(id, bands::FOOTAGE.1, "Background videos found");

        self.checkpoint(id)?;
        self.progress(id, bands::RENDER.0, "Rendering final video...");
        let output = c
            .renderer
            .render(&audio_path, &captions, &resources, settings)
            .await?;

        Ok(output)
    }

    /// Resolve footage for each keyword segment, then compact the
    /// unmatched intervals. Assets already used are excluded so the video
    /// does not repeat clips.
    async fn resolve_footage(
        &self,
        segments: &[KeywordSegment],
    ) -> WorkerResult<Vec<ResourceSegment>> {
        let mut used: Vec<String> = Vec::new();
        let mut resolved: Vec<ResourceSegment> = Vec::with_capacity(segments.len());

        for segment in segments {
            let hit = self
                .collaborators
                .footage
                .search(&segment.keywords, &used)
                .await?;
            if let Some(resource) = &hit {
                used.push(used_prefix(&resource.url));
            }
            resolved.push(ResourceSegment::new(segment.interval, hit));
        }

        if resolved.iter().all(|s| s.resource.is_none()) {
            return Err(WorkerError::NoFootageAvailable);
        }

        Ok(merge_absences(&resolved))
    }

    /// Cancellation checkpoint between stages. A stage already in flight
    /// always completes first; this is where the flag is observed.
    fn checkpoint(&self, id: &TaskId) -> WorkerResult<()> {
        if self.store.is_cancel_requested(id) {
            self.store.with_task(id, |t| t.mark_cancelled());
            return Err(WorkerError::Cancelled);
        }
        Ok(())
    }

    fn progress(&self, id: &TaskId, pct: u8, message: &str) {
        self.store.with_task(id, |t| t.set_progress(pct, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_models::{
        ErrorKind, Interval, Language, ResourceRef, TaskStatus, TimedCaption,
    };
    use reel_providers::ProviderResult;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    const KEYWORD_REPLY: &str = r#"[[[0, 3], ["city street", "traffic", "night"]], [[3, 6], ["ocean waves", "beach", "sunset"]]]"#;

    /// LLM fake; optionally blocks in generate_script until released.
    struct FakeLlm {
        gate: Option<Arc<Notify>>,
        script_calls: AtomicU32,
    }

    #[async_trait]
    impl ScriptGenerator for FakeLlm {
        async fn generate_script(&self, _: &str, _: Language) -> ProviderResult<String> {
            self.script_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok("Bananas are berries, but strawberries are not.".to_string())
        }

        async fn generate_keywords_raw(
            &self,
            _: &str,
            _: &[TimedCaption],
            _: Language,
        ) -> ProviderResult<String> {
            Ok(KEYWORD_REPLY.to_string())
        }

        async fn reformat_segments(&self, malformed: &str) -> ProviderResult<String> {
            Ok(malformed.to_string())
        }
    }

    struct FakeTts {
        called: AtomicBool,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeTts {
        async fn synthesize(&self, _: &str, _: &str, output: &Path) -> ProviderResult<()> {
            self.called.store(true, Ordering::SeqCst);
            std::fs::write(output, b"RIFFfake").map_err(|e| {
                reel_providers::ProviderError::permanent(format!("write failed: {e}"))
            })?;
            Ok(())
        }
    }

    struct FakeCaptions;

    #[async_trait]
    impl CaptionExtractor for FakeCaptions {
        async fn extract(&self, _: &Path) -> ProviderResult<Vec<TimedCaption>> {
            Ok(vec![
                TimedCaption::new(Interval::new(0.0, 3.0), "Bananas are berries"),
                TimedCaption::new(Interval::new(3.0, 6.0), "but strawberries are not"),
            ])
        }
    }

    struct FakeFootage {
        /// None for every segment when true.
        exhausted: bool,
        fail_permanent: bool,
    }

    #[async_trait]
    impl FootageProvider for FakeFootage {
        async fn search(
            &self,
            keywords: &[String],
            _: &[String],
        ) -> ProviderResult<Option<ResourceRef>> {
            if self.fail_permanent {
                return Err(ProviderError::permanent("invalid API key"));
            }
            if self.exhausted {
                return Ok(None);
            }
            Ok(Some(ResourceRef::new(
                format!("https://cdn.test/{}.hd.mp4", keywords[0].replace(' ', "-")),
                keywords[0].clone(),
            )))
        }
    }

    struct FakeRenderer {
        /// Audio path observed during the render call.
        seen_audio: StdMutex<Option<PathBuf>>,
        audio_existed: AtomicBool,
    }

    #[async_trait]
    impl VideoRenderer for FakeRenderer {
        async fn render(
            &self,
            audio: &Path,
            _: &[TimedCaption],
            segments: &[ResourceSegment],
            _: &VideoSettings,
        ) -> ProviderResult<String> {
            assert!(!segments.is_empty());
            self.audio_existed.store(audio.exists(), Ordering::SeqCst);
            *self.seen_audio.lock().unwrap() = Some(audio.to_path_buf());
            Ok("/videos/rendered_final.mp4".to_string())
        }
    }

    struct Fixture {
        pipeline: Pipeline,
        llm: Arc<FakeLlm>,
        tts: Arc<FakeTts>,
        renderer: Arc<FakeRenderer>,
    }

    fn fixture_with(footage: FakeFootage, gate: Option<Arc<Notify>>) -> Fixture {
        let llm = Arc::new(FakeLlm {
            gate,
            script_calls: AtomicU32::new(0),
        });
        let tts = Arc::new(FakeTts {
            called: AtomicBool::new(false),
        });
        let renderer = Arc::new(FakeRenderer {
            seen_audio: StdMutex::new(None),
            audio_existed: AtomicBool::new(false),
        });
        let collaborators = Arc::new(Collaborators {
            llm: llm.clone(),
            tts: tts.clone(),
            captions: Arc::new(FakeCaptions),
            footage: Arc::new(footage),
            renderer: renderer.clone(),
        });
        Fixture {
            pipeline: Pipeline::new(TaskStore::new(), collaborators),
            llm,
            tts,
            renderer,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            FakeFootage {
                exhausted: false,
                fail_permanent: false,
            },
            None,
        )
    }

    fn new_task() -> Task {
        Task::new("weird facts", VideoSettings::default())
    }

    #[tokio::test]
    async fn happy_path_completes_with_result() {
        let f = fixture();
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);

        f.pipeline.run(id.clone()).await;

        let done = f.pipeline.store().get(&id).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.progress, 100);
        assert_eq!(done.result.unwrap().video_path, "/videos/rendered_final.mp4");
        assert!(done.error.is_none());
    }

    #[tokio::test]
    async fn temp_audio_is_cleaned_up_after_success() {
        let f = fixture();
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);

        f.pipeline.run(id).await;

        // The renderer saw a real file; it is gone once the run settles.
        assert!(f.renderer.audio_existed.load(Ordering::SeqCst));
        let audio = f.renderer.seen_audio.lock().unwrap().clone().unwrap();
        assert!(!audio.exists());
    }

    #[tokio::test]
    async fn cancel_before_worker_starts_skips_every_stage() {
        let f = fixture();
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);
        f.pipeline.store().request_cancel(&id).unwrap();

        f.pipeline.run(id.clone()).await;

        let done = f.pipeline.store().get(&id).unwrap();
        assert_eq!(done.status, TaskStatus::Cancelled);
        assert_eq!(done.progress, 0);
        assert_eq!(f.llm.script_calls.load(Ordering::SeqCst), 0);
        assert!(!f.tts.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_mid_stage_is_observed_at_the_next_checkpoint() {
        // Scenario E: a processing task moves cancelling -> cancelled once
        // the in-flight stage finishes.
        let gate = Arc::new(Notify::new());
        let f = fixture_with(
            FakeFootage {
                exhausted: false,
                fail_permanent: false,
            },
            Some(gate.clone()),
        );
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);

        let runner = {
            let pipeline = f.pipeline.clone();
            let id = id.clone();
            tokio::spawn(async move { pipeline.run(id).await })
        };

        // Wait for the script stage to be in flight, then cancel.
        while f.llm.script_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        f.pipeline.store().request_cancel(&id).unwrap();
        assert_eq!(
            f.pipeline.store().get(&id).unwrap().status,
            TaskStatus::Cancelling
        );

        // Let the in-flight stage finish; the next checkpoint observes it.
        gate.notify_one();
        runner.await.unwrap();

        let done = f.pipeline.store().get(&id).unwrap();
        assert_eq!(done.status, TaskStatus::Cancelled);
        assert!(!f.tts.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn footage_exhaustion_fails_the_task() {
        let f = fixture_with(
            FakeFootage {
                exhausted: true,
                fail_permanent: false,
            },
            None,
        );
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);

        f.pipeline.run(id.clone()).await;

        let done = f.pipeline.store().get(&id).unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        let err = done.error.unwrap();
        assert_eq!(err.kind, ErrorKind::NoFootageAvailable);
        assert_eq!(err.message, "No background video available");
    }

    #[tokio::test]
    async fn permanent_provider_error_fails_with_its_kind() {
        let f = fixture_with(
            FakeFootage {
                exhausted: false,
                fail_permanent: true,
            },
            None,
        );
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);

        f.pipeline.run(id.clone()).await;

        let done = f.pipeline.store().get(&id).unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        let err = done.error.unwrap();
        assert_eq!(err.kind, ErrorKind::PermanentProvider);
        assert!(!err.retryable);
        // The raw provider text never reaches the client.
        assert!(!err.message.contains("invalid API key"));
    }

    #[tokio::test]
    async fn progress_messages_follow_the_stages() {
        let f = fixture();
        let task = new_task();
        let id = task.id.clone();
        f.pipeline.store().insert(task);

        f.pipeline.run(id.clone()).await;

        let done = f.pipeline.store().get(&id).unwrap();
        assert_eq!(done.message, "Video generation complete");
    }

    #[tokio::test]
    async fn submit_spawns_a_worker() {
        let f = fixture();
        let id = f.pipeline.submit(new_task());

        // Poll until the spawned worker settles the task.
        for _ in 0..200 {
            if f
                .pipeline
                .store()
                .get(&id)
                .map(|t| t.status.is_terminal())
                .unwrap_or(false)
            {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(
            f.pipeline.store().get(&id).unwrap().status,
            TaskStatus::Completed
        );
    }
}
