//! Segment recovery error types.

use thiserror::Error;

/// A single candidate segment did not match the expected shape.
///
/// These are recovered locally: the offending segment is logged and
/// dropped, and validation continues with the rest.
#[derive(Debug, Clone, Error)]
#[error("segment {index} has invalid shape: {reason}")]
pub struct SegmentShapeError {
    /// Position of the candidate in the normalized list.
    pub index: usize,
    pub reason: String,
}

impl SegmentShapeError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}
