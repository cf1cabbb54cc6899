//! The search-keyword stage: raw model text in, reconciled segments out.

use reel_models::{KeywordSegment, Language, TimedCaption};
use reel_providers::ScriptGenerator;
use reel_segments::{normalize, parse, reconcile, validate_all};
use tracing::{debug, warn};

use crate::error::{WorkerError, WorkerResult};

/// Run recovery over one raw model reply: parse, normalize, validate.
fn recover(raw: &str) -> Vec<KeywordSegment> {
    match parse(raw) {
        Some(value) => validate_all(&normalize(&value)),
        None => Vec::new(),
    }
}

/// Generate timed search keywords covering `[0, total_duration]`.
///
/// When the first reply yields nothing usable, the malformed text goes
/// back to the model once with a reformat instruction. A second empty
/// round is a stage failure, left to the caller's retry policy rather
/// than looping here.
pub async fn generate_keyword_segments(
    llm: &dyn ScriptGenerator,
    script: &str,
    captions: &[TimedCaption],
    language: Language,
    total_duration: f64,
) -> WorkerResult<Vec<KeywordSegment>> {
    let raw = llm.generate_keywords_raw(script, captions, language).await?;
    let mut segments = recover(&raw);

    if segments.is_empty() {
        warn!("keyword reply unusable, requesting a reformat");
        let corrected = llm.reformat_segments(&raw).await?;
        segments = recover(&corrected);
    }

    if segments.is_empty() {
        return Err(WorkerError::NoUsableSegments);
    }

    debug!(count = segments.len(), "keyword segments recovered");
    Ok(reconcile(segments, total_duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_models::Interval;
    use reel_providers::{ProviderResult, ScriptGenerator};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fake LLM returning canned keyword replies in sequence.
    struct ScriptedLlm {
        replies: Vec<String>,
        calls: AtomicU32,
        reformat_calls: AtomicU32,
    }

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|s| s.to_string()).collect(),
                calls: AtomicU32::new(0),
                reformat_calls: AtomicU32::new(0),
            }
        }

        fn next_reply(&self) -> String {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.replies
                .get(n)
                .cloned()
                .unwrap_or_else(|| "no more replies".to_string())
        }
    }

    #[async_trait]
    impl ScriptGenerator for ScriptedLlm {
        async fn generate_script(&self, _: &str, _: Language) -> ProviderResult<String> {
            Ok("a script".to_string())
        }

        async fn generate_keywords_raw(
            &self,
            _: &str,
            _: &[TimedCaption],
            _: Language,
        ) -> ProviderResult<String> {
            Ok(self.next_reply())
        }

        async fn reformat_segments(&self, _: &str) -> ProviderResult<String> {
            self.reformat_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.next_reply())
        }
    }

    fn captions() -> Vec<TimedCaption> {
        vec![TimedCaption::new(Interval::new(0.0, 5.0), "narration")]
    }

    #[tokio::test]
    async fn clean_reply_needs_no_correction() {
        let llm = ScriptedLlm::new(&[r#"[[[0, 2], ["a", "b", "c"]], [[2, 5], ["d", "e", "f"]]]"#]);
        let segments =
            generate_keyword_segments(&llm, "script", &captions(), Language::En, 5.0)
                .await
                .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(llm.reformat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_reply_triggers_one_reformat() {
        let llm = ScriptedLlm::new(&[
            "utter garbage, no structure at all",
            r#"[[[0, 5], ["x", "y", "z"]]]"#,
        ]);
        let segments =
            generate_keyword_segments(&llm, "script", &captions(), Language::En, 5.0)
                .await
                .unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(llm.reformat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn two_empty_rounds_fail_the_stage() {
        let llm = ScriptedLlm::new(&["garbage", "still garbage"]);
        let err = generate_keyword_segments(&llm, "script", &captions(), Language::En, 5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::NoUsableSegments));
        assert_eq!(llm.reformat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn output_always_covers_the_duration() {
        // Reply leaves gaps at both ends; reconciliation closes them.
        let llm = ScriptedLlm::new(&[r#"[[[1, 3], ["a", "b", "c"]]]"#]);
        let segments =
            generate_keyword_segments(&llm, "script", &captions(), Language::En, 4.0)
                .await
                .unwrap();
        assert_eq!(segments.first().unwrap().interval.start, 0.0);
        assert_eq!(segments.last().unwrap().interval.end, 4.0);
    }
}
