//! Pipeline events and observability sinks.
//!
//! Every noteworthy thing that happens inside a unit of work is reported as
//! a [`PipelineEvent`] to an [`EventSink`] passed in by the caller. Sinks
//! translate events into logs ([`TracingSink`]), metrics ([`MetricsSink`]),
//! or keep them for inspection ([`CollectingSink`]).

use std::sync::{Arc, Mutex};

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::resolver::Resolution;

/// Metric names as constants for consistency.
pub mod names {
    pub const UNITS_TOTAL: &str = "reelcut_units_total";
    pub const UNITS_FAILED_TOTAL: &str = "reelcut_units_failed_total";
    pub const CANDIDATES_TOTAL: &str = "reelcut_candidates_total";
    pub const CANDIDATES_REJECTED_TOTAL: &str = "reelcut_candidates_rejected_total";
    pub const PARSE_DEGRADED_TOTAL: &str = "reelcut_parse_degraded_total";
    pub const RESOLUTIONS_TOTAL: &str = "reelcut_resolutions_total";
    pub const REVISIONS_TOTAL: &str = "reelcut_revisions_total";
    pub const FALLBACK_TOTAL: &str = "reelcut_fallback_total";
    pub const TRANSITION_FALLBACK_TOTAL: &str = "reelcut_transition_fallback_total";
    pub const TRANSITION_ERRORS_TOTAL: &str = "reelcut_transition_errors_total";
    pub const CLIPS_MATERIALIZED_TOTAL: &str = "reelcut_clips_materialized_total";
    pub const EXTRACTION_FAILURES_TOTAL: &str = "reelcut_extraction_failures_total";
    pub const CLIP_DURATION_SECONDS: &str = "reelcut_clip_duration_seconds";
}

/// Something that happened while processing a (video, format) unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    UnitStarted {
        kind: String,
    },
    CandidatesParsed {
        kind: String,
        origin: &'static str,
        count: usize,
    },
    ParseDegraded {
        kind: String,
        reason: String,
    },
    CandidateRejected {
        kind: String,
        index: usize,
        reason: String,
    },
    TransitionsSynthesized {
        duration: f64,
    },
    TransitionsUnavailable {
        error: String,
    },
    SegmentResolved {
        kind: String,
        index: usize,
        resolution: Resolution,
    },
    SegmentRevised {
        kind: String,
        index: usize,
        start: f64,
        end: f64,
    },
    FallbackTaken {
        kind: String,
        reason: String,
    },
    ClipMaterialized {
        kind: String,
        index: usize,
        duration: f64,
    },
    ExtractionFailed {
        kind: String,
        index: usize,
        error: String,
    },
    UnitCompleted {
        kind: String,
        path: &'static str,
        clips: usize,
        extraction_failures: usize,
    },
    UnitFailed {
        kind: String,
        error: String,
    },
}

/// Receiver of pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Writes events as structured `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::UnitStarted { kind } => {
                info!(kind = %kind, "Format unit started");
            }
            PipelineEvent::CandidatesParsed { kind, origin, count } => {
                info!(kind = %kind, origin, count, "Parsed oracle candidates");
            }
            PipelineEvent::ParseDegraded { kind, reason } => {
                warn!(kind = %kind, reason = %reason, "Oracle response unusable");
            }
            PipelineEvent::CandidateRejected { kind, index, reason } => {
                debug!(kind = %kind, segment_index = index, reason = %reason, "Candidate rejected");
            }
            PipelineEvent::TransitionsSynthesized { duration } => {
                info!(duration, "No usable transitions, using quartile cut points");
            }
            PipelineEvent::TransitionsUnavailable { error } => {
                warn!(error = %error, "Transition request failed, continuing without oracle cut points");
            }
            PipelineEvent::SegmentResolved { kind, index, resolution } => {
                debug!(
                    kind = %kind,
                    segment_index = index,
                    resolution = resolution.as_str(),
                    "Segment resolved"
                );
            }
            PipelineEvent::SegmentRevised { kind, index, start, end } => {
                info!(kind = %kind, segment_index = index, start, end, "Segment revised");
            }
            PipelineEvent::FallbackTaken { kind, reason } => {
                warn!(kind = %kind, reason = %reason, "Falling back to standard highlights");
            }
            PipelineEvent::ClipMaterialized { kind, index, duration } => {
                info!(kind = %kind, segment_index = index, duration, "Clip materialized");
            }
            PipelineEvent::ExtractionFailed { kind, index, error } => {
                warn!(kind = %kind, segment_index = index, error = %error, "Clip extraction failed");
            }
            PipelineEvent::UnitCompleted {
                kind,
                path,
                clips,
                extraction_failures,
            } => {
                info!(kind = %kind, path, clips, extraction_failures, "Format unit completed");
            }
            PipelineEvent::UnitFailed { kind, error } => {
                warn!(kind = %kind, error = %error, "Format unit failed");
            }
        }
    }
}

/// Translates events into `metrics` counters and histograms.
///
/// Exporter installation is left to the embedding service.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSink;

impl EventSink for MetricsSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::UnitStarted { kind } => {
                counter!(names::UNITS_TOTAL, "kind" => kind.clone()).increment(1);
            }
            PipelineEvent::CandidatesParsed { kind, origin, count } => {
                counter!(names::CANDIDATES_TOTAL, "kind" => kind.clone(), "origin" => *origin)
                    .increment(*count as u64);
            }
            PipelineEvent::ParseDegraded { kind, .. } => {
                counter!(names::PARSE_DEGRADED_TOTAL, "kind" => kind.clone()).increment(1);
            }
            PipelineEvent::CandidateRejected { kind, .. } => {
                counter!(names::CANDIDATES_REJECTED_TOTAL, "kind" => kind.clone()).increment(1);
            }
            PipelineEvent::TransitionsSynthesized { .. } => {
                counter!(names::TRANSITION_FALLBACK_TOTAL).increment(1);
            }
            PipelineEvent::TransitionsUnavailable { .. } => {
                counter!(names::TRANSITION_ERRORS_TOTAL).increment(1);
            }
            PipelineEvent::SegmentResolved { kind, resolution, .. } => {
                counter!(
                    names::RESOLUTIONS_TOTAL,
                    "kind" => kind.clone(),
                    "resolution" => resolution.as_str()
                )
                .increment(1);
            }
            PipelineEvent::SegmentRevised { kind, .. } => {
                counter!(names::REVISIONS_TOTAL, "kind" => kind.clone()).increment(1);
            }
            PipelineEvent::FallbackTaken { kind, .. } => {
                counter!(names::FALLBACK_TOTAL, "kind" => kind.clone()).increment(1);
            }
            PipelineEvent::ClipMaterialized { kind, duration, .. } => {
                counter!(names::CLIPS_MATERIALIZED_TOTAL, "kind" => kind.clone()).increment(1);
                histogram!(names::CLIP_DURATION_SECONDS, "kind" => kind.clone()).record(*duration);
            }
            PipelineEvent::ExtractionFailed { kind, .. } => {
                counter!(names::EXTRACTION_FAILURES_TOTAL, "kind" => kind.clone()).increment(1);
            }
            PipelineEvent::UnitCompleted { .. } => {}
            PipelineEvent::UnitFailed { kind, .. } => {
                counter!(names::UNITS_FAILED_TOTAL, "kind" => kind.clone()).increment(1);
            }
        }
    }
}

/// Forwards every event to each inner sink, in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Logs plus metrics.
    pub fn standard() -> Self {
        Self::new(vec![Arc::new(TracingSink), Arc::new(MetricsSink)])
    }

    pub fn push(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &PipelineEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of received events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &PipelineEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}
