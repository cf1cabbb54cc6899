//! Time intervals and the segment types that flow through the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of search keywords every segment carries.
pub const KEYWORDS_PER_SEGMENT: usize = 3;

/// A half-open span of time in seconds, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the interval in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `other` begins exactly where this interval ends.
    pub fn is_adjacent_to(&self, other: &Interval) -> bool {
        (self.end - other.start).abs() < f64::EPSILON
    }

    /// Both endpoints are finite, non-negative, and ordered.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.start <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2})", self.start, self.end)
    }
}

/// A time interval paired with exactly three footage search keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordSegment {
    pub interval: Interval,
    /// Always exactly three non-empty strings. Short LLM output is padded,
    /// long output truncated, before a segment is constructed.
    pub keywords: [String; KEYWORDS_PER_SEGMENT],
}

impl KeywordSegment {
    pub fn new(interval: Interval, keywords: [String; KEYWORDS_PER_SEGMENT]) -> Self {
        Self { interval, keywords }
    }
}

/// A matched stock-footage asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceRef {
    /// Direct download/playback URL of the asset file.
    pub url: String,
    /// Provider-side identifier of the asset.
    pub provider_id: String,
}

impl ResourceRef {
    pub fn new(url: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            provider_id: provider_id.into(),
        }
    }
}

/// A time interval paired with a matched asset, or explicitly none when the
/// search stage found nothing for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceSegment {
    pub interval: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRef>,
}

impl ResourceSegment {
    pub fn new(interval: Interval, resource: Option<ResourceRef>) -> Self {
        Self { interval, resource }
    }

    pub fn matched(interval: Interval, resource: ResourceRef) -> Self {
        Self {
            interval,
            resource: Some(resource),
        }
    }

    pub fn absent(interval: Interval) -> Self {
        Self {
            interval,
            resource: None,
        }
    }
}

/// A spoken caption with its timing, produced by the caption extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimedCaption {
    pub interval: Interval,
    pub text: String,
}

impl TimedCaption {
    pub fn new(interval: Interval, text: impl Into<String>) -> Self {
        Self {
            interval,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_well_formed() {
        assert!(Interval::new(0.0, 5.0).is_well_formed());
        assert!(Interval::new(2.0, 2.0).is_well_formed());
        assert!(!Interval::new(3.0, 2.0).is_well_formed());
        assert!(!Interval::new(-1.0, 2.0).is_well_formed());
        assert!(!Interval::new(0.0, f64::NAN).is_well_formed());
    }

    #[test]
    fn interval_adjacency() {
        let a = Interval::new(0.0, 2.0);
        let b = Interval::new(2.0, 4.0);
        let c = Interval::new(2.5, 4.0);
        assert!(a.is_adjacent_to(&b));
        assert!(!a.is_adjacent_to(&c));
    }

    #[test]
    fn resource_segment_serializes_without_null_resource() {
        let seg = ResourceSegment::absent(Interval::new(0.0, 1.0));
        let json = serde_json::to_value(&seg).unwrap();
        assert!(json.get("resource").is_none());
    }
}
