//! Turning a sparse, possibly-overlapping segment set into a contiguous
//! cover of the audio duration.

use reel_models::{Interval, KeywordSegment};
use tracing::debug;

use crate::FILLER_KEYWORDS;

/// Produce a sorted, gap-free, non-overlapping cover of
/// `[0, total_duration]`.
///
/// Input segments may overlap, leave gaps, or run past the duration. Gaps
/// are closed with filler segments carrying a fixed generic keyword
/// triple; overlapping spans are clipped against what is already covered;
/// segments beyond the duration are clamped. Idempotent: re-running on its
/// own output returns the same sequence.
pub fn reconcile(segments: Vec<KeywordSegment>, total_duration: f64) -> Vec<KeywordSegment> {
    let mut sorted = segments;
    sorted.sort_by(|a, b| {
        a.interval
            .start
            .partial_cmp(&b.interval.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out: Vec<KeywordSegment> = Vec::with_capacity(sorted.len() + 2);
    let mut last_end = 0.0f64;

    for mut seg in sorted {
        if seg.interval.start >= total_duration {
            debug!(segment = %seg.interval, "dropping segment past total duration");
            continue;
        }
        seg.interval.end = seg.interval.end.min(total_duration);

        if seg.interval.start > last_end {
            out.push(filler(last_end, seg.interval.start));
        } else if seg.interval.start < last_end {
            // Overlap with already-covered time; keep only the new part.
            if seg.interval.end <= last_end {
                debug!(segment = %seg.interval, "dropping fully-covered segment");
                continue;
            }
            seg.interval.start = last_end;
        }

        last_end = last_end.max(seg.interval.end);
        out.push(seg);
    }

    if last_end < total_duration {
        out.push(filler(last_end, total_duration));
    }

    // The walk already emits in order; re-sort to keep the monotonicity
    // invariant even if that ever changes.
    out.sort_by(|a, b| {
        a.interval
            .start
            .partial_cmp(&b.interval.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

fn filler(start: f64, end: f64) -> KeywordSegment {
    KeywordSegment::new(
        Interval::new(start, end),
        FILLER_KEYWORDS.map(String::from),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, kws: [&str; 3]) -> KeywordSegment {
        KeywordSegment::new(Interval::new(start, end), kws.map(String::from))
    }

    fn assert_covers(segments: &[KeywordSegment], duration: f64) {
        assert!(!segments.is_empty());
        assert_eq!(segments[0].interval.start, 0.0);
        assert_eq!(segments.last().unwrap().interval.end, duration);
        for pair in segments.windows(2) {
            assert_eq!(
                pair[0].interval.end, pair[1].interval.start,
                "gap or overlap between {} and {}",
                pair[0].interval, pair[1].interval
            );
        }
    }

    #[test]
    fn contiguous_input_passes_through_unchanged() {
        // Scenario A
        let input = vec![seg(0.0, 2.0, ["a", "b", "c"]), seg(2.0, 5.0, ["d", "e", "f"])];
        let out = reconcile(input.clone(), 5.0);
        assert_eq!(out, input);
    }

    #[test]
    fn gaps_are_filled_front_and_back() {
        // Scenario B
        let out = reconcile(vec![seg(1.0, 3.0, ["a", "b", "c"])], 4.0);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].interval, Interval::new(0.0, 1.0));
        assert_eq!(out[0].keywords, FILLER_KEYWORDS.map(String::from));
        assert_eq!(out[1].interval, Interval::new(1.0, 3.0));
        assert_eq!(out[1].keywords, ["a", "b", "c"].map(String::from));
        assert_eq!(out[2].interval, Interval::new(3.0, 4.0));
        assert_covers(&out, 4.0);
    }

    #[test]
    fn empty_input_yields_single_filler() {
        let out = reconcile(vec![], 10.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].interval, Interval::new(0.0, 10.0));
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let out = reconcile(
            vec![seg(3.0, 5.0, ["x", "y", "z"]), seg(0.0, 3.0, ["a", "b", "c"])],
            5.0,
        );
        assert_eq!(out[0].interval.start, 0.0);
        assert_covers(&out, 5.0);
    }

    #[test]
    fn overlaps_are_clipped() {
        let out = reconcile(
            vec![seg(0.0, 3.0, ["a", "b", "c"]), seg(2.0, 5.0, ["d", "e", "f"])],
            5.0,
        );
        assert_covers(&out, 5.0);
        assert_eq!(out[1].interval, Interval::new(3.0, 5.0));
        assert_eq!(out[1].keywords[0], "d");
    }

    #[test]
    fn fully_covered_segments_are_dropped() {
        let out = reconcile(
            vec![seg(0.0, 5.0, ["a", "b", "c"]), seg(1.0, 3.0, ["d", "e", "f"])],
            5.0,
        );
        assert_eq!(out.len(), 1);
        assert_covers(&out, 5.0);
    }

    #[test]
    fn segments_past_duration_are_clamped_or_dropped() {
        let out = reconcile(
            vec![seg(0.0, 8.0, ["a", "b", "c"]), seg(9.0, 12.0, ["d", "e", "f"])],
            6.0,
        );
        assert_covers(&out, 6.0);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let inputs = vec![
            vec![seg(1.0, 3.0, ["a", "b", "c"])],
            vec![seg(0.0, 3.0, ["a", "b", "c"]), seg(2.0, 5.0, ["d", "e", "f"])],
            vec![],
            vec![seg(4.0, 9.0, ["x", "y", "z"]), seg(0.5, 2.0, ["p", "q", "r"])],
        ];
        for input in inputs {
            let once = reconcile(input, 10.0);
            let twice = reconcile(once.clone(), 10.0);
            assert_eq!(once, twice);
            assert_covers(&once, 10.0);
        }
    }
}
