//! Resolved segment entity and its lifecycle.
//!
//! ```text
//! Proposed ──> Resolved ──> Validated ──> Materialized
//!     │            │  └──────────────────────^
//!     └────────────┴──────────┴──> Rejected
//! ```
//!
//! A materialized segment is final output: every mutator returns
//! [`SegmentError::Immutable`] from then on.

use std::fmt;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::candidate::RawCandidate;
use crate::format::FormatSpec;

/// Lifecycle state of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentState {
    Proposed,
    Rejected,
    Resolved,
    Validated,
    Materialized,
}

impl SegmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentState::Proposed => "proposed",
            SegmentState::Rejected => "rejected",
            SegmentState::Resolved => "resolved",
            SegmentState::Validated => "validated",
            SegmentState::Materialized => "materialized",
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: SegmentState) -> bool {
        use SegmentState::*;
        matches!(
            (self, next),
            (Proposed, Resolved)
                | (Resolved, Resolved)
                | (Resolved, Validated)
                | (Resolved, Materialized)
                | (Validated, Materialized)
                | (Proposed | Resolved | Validated, Rejected)
        )
    }
}

impl fmt::Display for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which oracle path produced the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOrigin {
    /// Format-specific candidate request.
    Custom,
    /// Oracle's generic highlight summary (fallback path).
    Standard,
}

/// Segment invariant violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    #[error("Invalid interval: end ({end:.3}s) must be after start ({start:.3}s)")]
    InvalidInterval { start: f64, end: f64 },

    #[error("Non-numeric bound: {0}")]
    NonFinite(f64),

    #[error("Interval starts before the video: {0:.3}s")]
    NegativeStart(f64),

    #[error("Interval starts at {start:.3}s, past the {duration:.3}s video")]
    PastEnd { start: f64, duration: f64 },

    #[error("Interval too short: {duration:.3}s < minimum {min:.3}s")]
    TooShort { duration: f64, min: f64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: SegmentState, to: SegmentState },

    #[error("Segment is materialized and immutable")]
    Immutable,
}

/// A time-bounded unit of video eligible for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    index: usize,
    start: f64,
    end: f64,
    label: String,
    score: Option<f64>,
    state: SegmentState,
    origin: SegmentOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    extra: Map<String, Value>,
}

impl Segment {
    /// Create a proposed segment, checking `end > start` and finiteness.
    pub fn new(
        index: usize,
        start: f64,
        end: f64,
        label: impl Into<String>,
        origin: SegmentOrigin,
    ) -> Result<Self, SegmentError> {
        check_interval(start, end)?;
        Ok(Self {
            index,
            start,
            end,
            label: label.into(),
            score: None,
            state: SegmentState::Proposed,
            origin,
            artifact_path: None,
            extra: Map::new(),
        })
    }

    /// Promote a raw candidate, applying permissive defaults.
    ///
    /// A missing start becomes `0`, a missing end becomes
    /// `start + target_duration`. The interval must then satisfy
    /// `start >= 0`, `end > start` and `end - start >= min_duration`.
    pub fn from_candidate(
        index: usize,
        candidate: &RawCandidate,
        spec: &FormatSpec,
        min_duration: f64,
    ) -> Result<Self, SegmentError> {
        let start = candidate.start.unwrap_or(0.0);
        let end = candidate.end.unwrap_or(start + spec.target_duration);
        let mut segment = Self::new(index, start, end, candidate.description.clone(), SegmentOrigin::Custom)?;
        let duration = segment.duration();
        if duration < min_duration {
            return Err(SegmentError::TooShort { duration, min: min_duration });
        }
        segment.score = candidate.importance;
        segment.extra = candidate.extra.clone();
        Ok(segment)
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Discovery order within the batch it came from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    pub fn origin(&self) -> SegmentOrigin {
        self.origin
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Whether this segment overlaps `other` by a positive amount.
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Fail when the segment starts at or after the end of a video of
    /// `duration` seconds.
    pub fn ensure_within(&self, duration: f64) -> Result<(), SegmentError> {
        if self.start >= duration {
            return Err(SegmentError::PastEnd {
                start: self.start,
                duration,
            });
        }
        Ok(())
    }

    /// Rewrite the interval in place.
    pub fn set_bounds(&mut self, start: f64, end: f64) -> Result<(), SegmentError> {
        self.ensure_mutable()?;
        check_interval(start, end)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Record that the resolver has produced the current bounds.
    pub fn mark_resolved(&mut self) -> Result<(), SegmentError> {
        self.transition(SegmentState::Resolved)
    }

    /// Record that the coherence pass has run.
    pub fn mark_validated(&mut self) -> Result<(), SegmentError> {
        self.transition(SegmentState::Validated)
    }

    /// Drop this segment from the run.
    pub fn reject(&mut self) -> Result<(), SegmentError> {
        self.transition(SegmentState::Rejected)
    }

    /// Attach the produced artifact. Terminal.
    pub fn materialize(&mut self, artifact: impl Into<PathBuf>) -> Result<(), SegmentError> {
        self.transition(SegmentState::Materialized)?;
        self.artifact_path = Some(artifact.into());
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<(), SegmentError> {
        if self.state == SegmentState::Materialized {
            Err(SegmentError::Immutable)
        } else {
            Ok(())
        }
    }

    fn transition(&mut self, next: SegmentState) -> Result<(), SegmentError> {
        self.ensure_mutable()?;
        if !self.state.can_transition_to(next) {
            return Err(SegmentError::InvalidTransition { from: self.state, to: next });
        }
        self.state = next;
        Ok(())
    }
}

fn check_interval(start: f64, end: f64) -> Result<(), SegmentError> {
    if !start.is_finite() {
        return Err(SegmentError::NonFinite(start));
    }
    if !end.is_finite() {
        return Err(SegmentError::NonFinite(end));
    }
    if start < 0.0 {
        return Err(SegmentError::NegativeStart(start));
    }
    if end <= start {
        return Err(SegmentError::InvalidInterval { start, end });
    }
    Ok(())
}
