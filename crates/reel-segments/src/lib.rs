//! Structured-output recovery and interval reconciliation.
//!
//! The keyword-generation model returns free-form text that is supposed to
//! be a JSON array of `[[start, end], ["kw1", "kw2", "kw3"]]` tuples but
//! frequently is not. This crate turns that text into a gap-free,
//! non-overlapping sequence of keyword segments, and later reconciles the
//! footage-search results with intervals the search left unmatched.
//!
//! Stages, in pipeline order:
//! 1. [`parse`] — salvage a JSON value from the raw text
//! 2. [`normalize`] / [`validate_all`] — coerce it into keyword segments
//! 3. [`reconcile`] — produce a contiguous cover of the audio duration
//! 4. [`merge_absences`] — compact unmatched footage intervals

pub mod error;
pub mod merge;
pub mod normalize;
pub mod parse;
pub mod reconcile;

pub use error::SegmentShapeError;
pub use merge::merge_absences;
pub use normalize::{normalize, validate, validate_all, ParsedShape};
pub use parse::parse;
pub use reconcile::reconcile;

/// Filler term used to pad short keyword lists up to three entries.
pub const FILLER_KEYWORD: &str = "nature landscape";

/// Keyword triple carried by synthesized gap-filler segments.
pub const FILLER_KEYWORDS: [&str; 3] = ["nature landscape", "scenic background", "calm scenery"];
