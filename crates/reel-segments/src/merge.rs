//! Compacting footage-search results with unmatched intervals.

use reel_models::{Interval, ResourceSegment};

/// Coalesce runs of segments the footage search left unmatched.
///
/// Consecutive absent entries collapse into one wide absent interval. When
/// the run directly follows a matched interval that ends where the run
/// begins, the matched interval is extended over the run instead (the
/// renderer keeps showing that clip), inheriting its resource. A run at
/// the very start of the sequence has nothing to extend and stays absent.
///
/// Pure fold over the ordered list: never reorders, only merges adjacent
/// runs, and the union of output intervals equals the union of the input.
pub fn merge_absences(segments: &[ResourceSegment]) -> Vec<ResourceSegment> {
    let mut merged: Vec<ResourceSegment> = Vec::with_capacity(segments.len());
    let mut i = 0;

    while i < segments.len() {
        let seg = &segments[i];
        if seg.resource.is_some() {
            merged.push(seg.clone());
            i += 1;
            continue;
        }

        // Extent of the absent run starting at i.
        let mut j = i + 1;
        while j < segments.len() && segments[j].resource.is_none() {
            j += 1;
        }
        let run_end = segments[j - 1].interval.end;

        match merged.last_mut() {
            Some(prev) if prev.resource.is_some() && prev.interval.is_adjacent_to(&seg.interval) => {
                prev.interval.end = run_end;
            }
            _ => {
                merged.push(ResourceSegment::absent(Interval::new(
                    seg.interval.start,
                    run_end,
                )));
            }
        }
        i = j;
    }

    merged
}
