//! Shared data models for the ReelGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Tasks and their lifecycle states
//! - Time intervals and keyword/resource segments
//! - Voice and font settings
//! - Error descriptors surfaced to clients

pub mod segment;
pub mod settings;
pub mod task;

// Re-export common types
pub use segment::{Interval, KeywordSegment, ResourceRef, ResourceSegment, TimedCaption, KEYWORDS_PER_SEGMENT};
pub use settings::{FontSettings, Language, VideoSettings};
pub use task::{ErrorKind, Task, TaskError, TaskId, TaskResult, TaskStatus};
