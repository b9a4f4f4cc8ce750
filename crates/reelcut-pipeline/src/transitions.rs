//! Transition index: natural cut points of a video.
//!
//! A [`TransitionSet`] is built once per video and shared read-only by
//! every format unit. It always contains `0` and the total duration, so
//! the resolver always has at least one pair to snap to.

use serde_json::Value;

use reelcut_models::timestamp::seconds_from_value;

use crate::error::{PipelineError, PipelineResult};
use crate::parser::extract_json;

/// Points closer than this are considered the same cut.
pub const DEDUP_EPSILON: f64 = 1e-6;

/// Fractions of the duration used when no transitions are usable.
const QUARTILES: [f64; 3] = [0.25, 0.5, 0.75];

/// One oracle-suggested cut point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionPoint {
    pub time: f64,
    pub importance: Option<f64>,
}

impl TransitionPoint {
    pub fn new(time: f64) -> Self {
        Self { time, importance: None }
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance);
        self
    }
}

/// Parsed answer to the transitions prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionReport {
    pub video_duration: Option<f64>,
    pub points: Vec<TransitionPoint>,
}

impl TransitionReport {
    /// Tolerantly parse the oracle's transitions answer.
    ///
    /// Accepts `{"video_duration": s, "transitions": [...]}` where each
    /// transition is a number, a timestamp string, or an object with a
    /// `time`/`timestamp`/`start_time` field and optional importance.
    /// Unparsable text yields an empty report.
    pub fn parse(raw: &str) -> Self {
        let Some(value) = extract_json(raw) else {
            return Self::default();
        };

        let video_duration = ["video_duration", "duration", "total_duration"]
            .iter()
            .find_map(|k| value.get(*k).and_then(seconds_from_value));

        let items = match &value {
            Value::Array(items) => items.as_slice(),
            _ => ["transitions", "cut_points", "scenes"]
                .iter()
                .find_map(|k| value.get(*k).and_then(Value::as_array))
                .map(Vec::as_slice)
                .unwrap_or_default(),
        };

        Self {
            video_duration,
            points: items.iter().filter_map(point_from_value).collect(),
        }
    }
}

fn point_from_value(value: &Value) -> Option<TransitionPoint> {
    match value {
        Value::Object(map) => {
            let time = ["time", "timestamp", "start_time", "at"]
                .iter()
                .find_map(|k| map.get(*k).and_then(seconds_from_value))?;
            let importance = ["importance", "importance_score", "score"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_f64));
            Some(TransitionPoint { time, importance })
        }
        other => seconds_from_value(other).map(TransitionPoint::new),
    }
}

/// Ordered, deduplicated cut points including `0` and the duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSet {
    points: Vec<f64>,
    synthesized: bool,
}

impl TransitionSet {
    /// Build the set for a video of `duration` seconds.
    ///
    /// Points that are non-finite, outside `(0, duration)` or below
    /// `min_importance` are dropped. Points without an importance are kept.
    /// If no interior point survives, quartile points are synthesized.
    pub fn build(
        duration: f64,
        suggested: &[TransitionPoint],
        min_importance: Option<f64>,
    ) -> PipelineResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(PipelineError::no_duration(format!("invalid duration {duration}")));
        }

        let mut interior: Vec<f64> = suggested
            .iter()
            .filter(|p| match (min_importance, p.importance) {
                (Some(min), Some(importance)) => importance >= min,
                _ => true,
            })
            .map(|p| p.time)
            .filter(|t| t.is_finite() && *t > DEDUP_EPSILON && *t < duration - DEDUP_EPSILON)
            .collect();

        let synthesized = interior.is_empty();
        if synthesized {
            interior = QUARTILES.iter().map(|q| q * duration).collect();
        }

        let mut points = Vec::with_capacity(interior.len() + 2);
        points.push(0.0);
        points.extend(interior);
        points.push(duration);
        points.sort_by(f64::total_cmp);
        points.dedup_by(|a, b| (*a - *b).abs() < DEDUP_EPSILON);

        Ok(Self { points, synthesized })
    }

    /// Build directly from known points, without filtering or fallback.
    pub fn from_points(points: impl IntoIterator<Item = f64>) -> Self {
        let mut points: Vec<f64> = points.into_iter().filter(|t| t.is_finite()).collect();
        points.sort_by(f64::total_cmp);
        points.dedup_by(|a, b| (*a - *b).abs() < DEDUP_EPSILON);
        Self {
            points,
            synthesized: false,
        }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last point, i.e. the video duration for built sets.
    pub fn duration(&self) -> Option<f64> {
        self.points.last().copied()
    }

    /// Whether the interior points are the quartile fallback.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(times: &[f64]) -> Vec<TransitionPoint> {
        times.iter().copied().map(TransitionPoint::new).collect()
    }

    #[test]
    fn test_build_sorts_dedups_and_bounds() {
        let set = TransitionSet::build(60.0, &pts(&[40.0, 10.0, 23.0, 10.0000001, 75.0, -3.0, f64::NAN]), None)
            .unwrap();
        assert_eq!(set.points(), &[0.0, 10.0, 23.0, 40.0, 60.0]);
        assert!(!set.is_synthesized());
        assert_eq!(set.duration(), Some(60.0));
    }

    #[test]
    fn test_quartile_fallback() {
        let set = TransitionSet::build(120.0, &[], None).unwrap();
        assert_eq!(set.points(), &[0.0, 30.0, 60.0, 90.0, 120.0]);
        assert!(set.is_synthesized());

        // Only boundary points suggested: still nothing usable inside.
        let set = TransitionSet::build(120.0, &pts(&[0.0, 120.0]), None).unwrap();
        assert!(set.is_synthesized());
    }

    #[test]
    fn test_min_importance_filter() {
        let suggested = vec![
            TransitionPoint::new(10.0).with_importance(2.0),
            TransitionPoint::new(20.0).with_importance(8.0),
            TransitionPoint::new(30.0),
        ];
        let set = TransitionSet::build(60.0, &suggested, Some(5.0)).unwrap();
        assert_eq!(set.points(), &[0.0, 20.0, 30.0, 60.0]);
    }

    #[test]
    fn test_invalid_duration() {
        assert!(matches!(
            TransitionSet::build(0.0, &[], None),
            Err(PipelineError::NoDuration(_))
        ));
        assert!(TransitionSet::build(f64::INFINITY, &[], None).is_err());
    }

    #[test]
    fn test_parse_report() {
        let raw = r#"Sure! {"video_duration": "00:02:00", "transitions": [
            {"time": 12, "importance": 7}, {"timestamp": "00:30"}, 47, "bad", {"note": "no time"}
        ]}"#;
        let report = TransitionReport::parse(raw);
        assert_eq!(report.video_duration, Some(120.0));
        let times: Vec<f64> = report.points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![12.0, 30.0, 47.0]);
        assert_eq!(report.points[0].importance, Some(7.0));
    }

    #[test]
    fn test_parse_report_garbage() {
        assert_eq!(TransitionReport::parse("no idea"), TransitionReport::default());
    }
}
