//! Coercing parsed JSON values into canonical keyword segments.

use reel_models::{Interval, KeywordSegment, KEYWORDS_PER_SEGMENT};
use serde_json::Value;
use tracing::warn;

use crate::error::SegmentShapeError;
use crate::FILLER_KEYWORD;

/// Keys under which models like to wrap the segment list, in priority order.
const WRAPPER_KEYS: [&str; 5] = ["segments", "result", "data", "output", "keywords"];

/// The shape the parser recovered, resolved once here instead of scattering
/// shape checks through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedShape {
    /// Top-level array of candidates.
    List(Vec<Value>),
    /// Object wrapping the candidate list under a conventional key, or an
    /// object whose values are themselves lists.
    ObjectWrapper(Vec<Value>),
    /// Nothing a segment list can be extracted from.
    Unrecognized,
}

impl ParsedShape {
    /// Classify a parsed value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(items) => ParsedShape::List(items.clone()),
            Value::Object(map) => {
                for key in WRAPPER_KEYS {
                    if let Some(Value::Array(items)) = map.get(key) {
                        return ParsedShape::ObjectWrapper(items.clone());
                    }
                }
                // Fall back to concatenating any array-valued fields.
                let nested: Vec<Value> = map
                    .values()
                    .filter_map(|v| v.as_array())
                    .flat_map(|a| a.iter().cloned())
                    .collect();
                if nested.is_empty() {
                    ParsedShape::Unrecognized
                } else {
                    ParsedShape::ObjectWrapper(nested)
                }
            }
            _ => ParsedShape::Unrecognized,
        }
    }
}

/// Flatten a parsed value into a list of raw segment candidates.
///
/// Unknown shapes degrade to an empty list rather than an error; the
/// caller treats "no candidates" as a trigger for self-correction.
pub fn normalize(value: &Value) -> Vec<Value> {
    match ParsedShape::of(value) {
        ParsedShape::List(items) | ParsedShape::ObjectWrapper(items) => items,
        ParsedShape::Unrecognized => Vec::new(),
    }
}

/// Validate one candidate into a canonical segment.
///
/// A candidate is either a `[[start, end], [keywords...]]` pair or an
/// object with named interval/keyword fields. Keyword lists are padded
/// with [`FILLER_KEYWORD`] up to three entries and truncated past three;
/// this is a deliberate lossy policy so callers always receive exactly
/// three non-empty strings.
pub fn validate(candidate: &Value, index: usize) -> Result<KeywordSegment, SegmentShapeError> {
    let (interval_value, keywords_value) = split_candidate(candidate, index)?;

    let interval = validate_interval(interval_value, index)?;
    let keywords = coerce_keywords(keywords_value, index)?;

    Ok(KeywordSegment::new(interval, keywords))
}

/// Validate every candidate, dropping and logging the ones that fail.
pub fn validate_all(candidates: &[Value]) -> Vec<KeywordSegment> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| match validate(candidate, index) {
            Ok(segment) => Some(segment),
            Err(err) => {
                warn!(%err, "dropping malformed segment candidate");
                None
            }
        })
        .collect()
}

fn split_candidate(
    candidate: &Value,
    index: usize,
) -> Result<(&Value, &Value), SegmentShapeError> {
    match candidate {
        Value::Array(pair) if pair.len() == 2 => Ok((&pair[0], &pair[1])),
        Value::Array(pair) => Err(SegmentShapeError::new(
            index,
            format!("expected 2 elements, got {}", pair.len()),
        )),
        Value::Object(map) => {
            let interval = map
                .get("interval")
                .or_else(|| map.get("time"))
                .ok_or_else(|| SegmentShapeError::new(index, "missing interval field"))?;
            let keywords = map
                .get("keywords")
                .or_else(|| map.get("queries"))
                .ok_or_else(|| SegmentShapeError::new(index, "missing keywords field"))?;
            Ok((interval, keywords))
        }
        other => Err(SegmentShapeError::new(
            index,
            format!("expected pair or object, got {}", type_name(other)),
        )),
    }
}

fn validate_interval(value: &Value, index: usize) -> Result<Interval, SegmentShapeError> {
    let pair = value
        .as_array()
        .filter(|a| a.len() == 2)
        .ok_or_else(|| SegmentShapeError::new(index, "interval is not a 2-element array"))?;

    let start = pair[0]
        .as_f64()
        .ok_or_else(|| SegmentShapeError::new(index, "interval start is not numeric"))?;
    let end = pair[1]
        .as_f64()
        .ok_or_else(|| SegmentShapeError::new(index, "interval end is not numeric"))?;

    let interval = Interval::new(start, end);
    if !interval.is_well_formed() {
        return Err(SegmentShapeError::new(
            index,
            format!("interval {} is not well-formed", interval),
        ));
    }
    Ok(interval)
}

fn coerce_keywords(
    value: &Value,
    index: usize,
) -> Result<[String; KEYWORDS_PER_SEGMENT], SegmentShapeError> {
    let mut keywords: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        other => {
            return Err(SegmentShapeError::new(
                index,
                format!("keywords are not a list or string, got {}", type_name(other)),
            ))
        }
    };

    keywords.truncate(KEYWORDS_PER_SEGMENT);
    while keywords.len() < KEYWORDS_PER_SEGMENT {
        keywords.push(FILLER_KEYWORD.to_string());
    }

    // len() == 3 here, so the conversion cannot fail.
    keywords
        .try_into()
        .map_err(|_| SegmentShapeError::new(index, "keyword coercion failed"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
