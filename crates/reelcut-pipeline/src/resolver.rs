//! Duration resolution.
//!
//! Brings a candidate interval within tolerance of the format's target
//! duration, preferring natural cut points:
//!
//! 1. accept the candidate if it is already within tolerance;
//! 2. otherwise pick the transition pair whose length is closest to the
//!    target;
//! 3. if even that pair is out of tolerance, clamp to `[start, start + target]`.

use serde::Serialize;

use reelcut_models::FormatSpec;

use crate::transitions::TransitionSet;

/// Deviations closer than this are treated as ties.
const TIE_EPSILON: f64 = 1e-9;

/// Which resolution path produced the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    AsIs,
    Snapped,
    Clamped,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::AsIs => "as_is",
            Resolution::Snapped => "snapped",
            Resolution::Clamped => "clamped",
        }
    }
}

/// A resolved interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub start: f64,
    pub end: f64,
    pub resolution: Resolution,
}

impl Resolved {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Resolve `(start, end)` against `spec` using the cut points in `transitions`.
pub fn resolve(start: f64, end: f64, spec: &FormatSpec, transitions: &TransitionSet) -> Resolved {
    if spec.accepts(end - start) {
        return Resolved {
            start,
            end,
            resolution: Resolution::AsIs,
        };
    }

    if let Some((t_i, t_j)) = best_pair(start, end, spec.target_duration, transitions.points()) {
        if spec.accepts(t_j - t_i) {
            return Resolved {
                start: t_i,
                end: t_j,
                resolution: Resolution::Snapped,
            };
        }
    }

    Resolved {
        start,
        end: start + spec.target_duration,
        resolution: Resolution::Clamped,
    }
}

/// Exhaustive search for the pair `(t_i, t_j)`, `t_j > t_i`, minimising
/// `|(t_j - t_i) - target|`.
///
/// Equal deviations are broken by closeness of the pair's midpoint to the
/// candidate's midpoint, then by the smaller `t_i`. `points` must be sorted.
/// The midpoint rule comes first: with points `[0, 10, 23, 40, 60]`, target
/// 15 and candidate `(5, 50)`, both `(10, 23)` and `(23, 40)` miss by 2s
/// and the candidate must land on `(23, 40)`.
fn best_pair(start: f64, end: f64, target: f64, points: &[f64]) -> Option<(f64, f64)> {
    let candidate_mid = (start + end) / 2.0;
    let mut best: Option<(f64, f64, f64, f64)> = None; // (t_i, t_j, deviation, mid distance)

    for (i, &t_i) in points.iter().enumerate() {
        for &t_j in &points[i + 1..] {
            if t_j <= t_i {
                continue;
            }
            let deviation = ((t_j - t_i) - target).abs();
            let mid_distance = ((t_i + t_j) / 2.0 - candidate_mid).abs();

            let better = match best {
                None => true,
                Some((b_i, _, b_dev, b_mid)) => {
                    if deviation < b_dev - TIE_EPSILON {
                        true
                    } else if deviation > b_dev + TIE_EPSILON {
                        false
                    } else if mid_distance < b_mid - TIE_EPSILON {
                        true
                    } else if mid_distance > b_mid + TIE_EPSILON {
                        false
                    } else {
                        t_i < b_i
                    }
                }
            };
            if better {
                best = Some((t_i, t_j, deviation, mid_distance));
            }
        }
    }

    best.map(|(t_i, t_j, _, _)| (t_i, t_j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(target: f64, tolerance: f64) -> FormatSpec {
        FormatSpec::new("test", target, tolerance)
    }

    #[test]
    fn test_within_tolerance_is_kept() {
        let set = TransitionSet::from_points([0.0, 10.0, 60.0]);
        let resolved = resolve(3.0, 17.5, &spec(15.0, 1.0), &set);
        assert_eq!(resolved.resolution, Resolution::AsIs);
        assert_eq!((resolved.start, resolved.end), (3.0, 17.5));
    }

    #[test]
    fn test_snaps_to_pair_nearest_the_candidate() {
        // (10,23) and (23,40) both deviate by 2s; (23,40) sits nearer the candidate.
        let set = TransitionSet::from_points([0.0, 10.0, 23.0, 40.0, 60.0]);
        let resolved = resolve(5.0, 50.0, &spec(15.0, 2.0), &set);
        assert_eq!(resolved.resolution, Resolution::Snapped);
        assert_eq!((resolved.start, resolved.end), (23.0, 40.0));
    }

    #[test]
    fn test_end_to_end_pair() {
        let set = TransitionSet::from_points([0.0, 12.0, 30.0, 47.0, 120.0]);
        let resolved = resolve(10.0, 45.0, &spec(15.0, 2.0), &set);
        assert_eq!((resolved.start, resolved.end), (30.0, 47.0));
        assert_eq!(resolved.resolution, Resolution::Snapped);
    }

    #[test]
    fn test_clamps_when_no_pair_fits() {
        let set = TransitionSet::from_points([0.0, 10.0, 23.0, 40.0, 60.0]);
        let resolved = resolve(5.0, 50.0, &spec(15.0, 0.5), &set);
        assert_eq!(resolved.resolution, Resolution::Clamped);
        assert_eq!((resolved.start, resolved.end), (5.0, 20.0));
        assert_eq!(resolved.duration(), 15.0);
    }

    #[test]
    fn test_clamps_with_degenerate_set() {
        let set = TransitionSet::from_points([30.0]);
        let resolved = resolve(2.0, 4.0, &spec(6.0, 0.0), &set);
        assert_eq!(resolved.resolution, Resolution::Clamped);
        assert_eq!((resolved.start, resolved.end), (2.0, 8.0));
    }

    #[test]
    fn test_equal_deviation_and_distance_prefers_smaller_start() {
        // (0,10) and (25,35) are both exact and equidistant from midpoint 17.5.
        let set = TransitionSet::from_points([0.0, 10.0, 25.0, 35.0]);
        let resolved = resolve(0.0, 35.0, &spec(10.0, 0.0), &set);
        assert_eq!((resolved.start, resolved.end), (0.0, 10.0));
    }

    #[test]
    fn test_result_always_within_tolerance_or_clamped() {
        let set = TransitionSet::from_points([0.0, 7.0, 19.0, 26.0, 44.0, 52.0, 90.0]);
        let candidates = [(0.0, 90.0), (10.0, 11.0), (30.0, 31.0), (5.0, 40.0), (50.0, 80.0)];
        for target in [6.0, 15.0, 30.0] {
            let spec = spec(target, 0.5);
            for (start, end) in candidates {
                let r = resolve(start, end, &spec, &set);
                match r.resolution {
                    Resolution::Clamped => assert_eq!(r.duration(), target),
                    _ => assert!(spec.accepts(r.duration()), "{:?} for target {}", r, target),
                }
            }
        }
    }
}
