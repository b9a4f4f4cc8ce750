//! Ranking and final selection.

use reelcut_models::{FormatSpec, Segment};

/// Pick at most `spec.max_segments` segments, best score first.
///
/// Segments without a score rank below every scored segment. The sort is
/// stable, so equal scores keep discovery order. Exclusive formats skip
/// any segment that overlaps one already selected.
pub fn select(mut segments: Vec<Segment>, spec: &FormatSpec) -> Vec<Segment> {
    segments.sort_by(|a, b| rank_key(b).total_cmp(&rank_key(a)));

    let mut selected: Vec<Segment> = Vec::with_capacity(spec.max_segments.min(segments.len()));
    for segment in segments {
        if selected.len() >= spec.max_segments {
            break;
        }
        if spec.exclusive && selected.iter().any(|s| s.overlaps(&segment)) {
            continue;
        }
        selected.push(segment);
    }
    selected
}

fn rank_key(segment: &Segment) -> f64 {
    segment
        .score()
        .filter(|s| !s.is_nan())
        .unwrap_or(f64::NEG_INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_models::SegmentOrigin;

    fn segment(index: usize, start: f64, end: f64, score: Option<f64>) -> Segment {
        let seg = Segment::new(index, start, end, format!("s{index}"), SegmentOrigin::Custom).unwrap();
        match score {
            Some(score) => seg.with_score(score),
            None => seg,
        }
    }

    fn indices(selected: &[Segment]) -> Vec<usize> {
        selected.iter().map(Segment::index).collect()
    }

    #[test]
    fn test_top_two_with_tie_keeps_discovery_order() {
        let segments = vec![
            segment(0, 0.0, 10.0, Some(3.0)),
            segment(1, 10.0, 20.0, Some(9.0)),
            segment(2, 20.0, 30.0, Some(9.0)),
            segment(3, 30.0, 40.0, Some(1.0)),
        ];
        let spec = FormatSpec::new("t", 10.0, 1.0).with_max_segments(2);
        assert_eq!(indices(&select(segments, &spec)), vec![1, 2]);
    }

    #[test]
    fn test_missing_score_ranks_last() {
        let segments = vec![
            segment(0, 0.0, 10.0, None),
            segment(1, 10.0, 20.0, Some(0.5)),
            segment(2, 20.0, 30.0, Some(f64::NAN)),
        ];
        let spec = FormatSpec::new("t", 10.0, 1.0).with_max_segments(3);
        assert_eq!(indices(&select(segments, &spec)), vec![1, 0, 2]);
    }

    #[test]
    fn test_overlap_allowed_by_default() {
        let segments = vec![segment(0, 0.0, 15.0, Some(9.0)), segment(1, 5.0, 20.0, Some(8.0))];
        let spec = FormatSpec::new("t", 15.0, 1.0).with_max_segments(2);
        assert_eq!(select(segments, &spec).len(), 2);
    }

    #[test]
    fn test_exclusive_skips_overlaps() {
        let segments = vec![
            segment(0, 0.0, 15.0, Some(9.0)),
            segment(1, 5.0, 20.0, Some(8.0)),
            segment(2, 20.0, 35.0, Some(7.0)),
        ];
        let spec = FormatSpec::new("t", 15.0, 1.0)
            .with_max_segments(2)
            .with_exclusive(true);
        assert_eq!(indices(&select(segments, &spec)), vec![0, 2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(select(vec![], &FormatSpec::bumper()).is_empty());
    }
}
