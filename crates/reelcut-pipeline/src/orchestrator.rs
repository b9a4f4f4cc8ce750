//! Pipeline orchestration.
//!
//! One unit of work is a (video, format) pair. Each unit runs the fallback
//! chain:
//!
//! 1. ask for format-specific candidates, then parse, resolve, validate,
//!    select and materialize them;
//! 2. if nothing materialized, adapt the oracle's generic highlights and
//!    materialize those;
//! 3. otherwise finish with an empty result.
//!
//! The transition set is built once per video and shared by every unit.
//! Units are isolated: a failing unit never cancels its siblings.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn, Instrument};

use reelcut_media::{ClipExtractor, DurationProbe, FfmpegExtractor, FfprobeProbe};
use reelcut_models::{ArtifactName, FormatSpec, MaterializedClip, Segment};
use reelcut_oracle::prompts::{candidate_prompt, transitions_prompt};
use reelcut_oracle::{AssetRef, Oracle, TwelveLabsClient};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::events::{EventSink, FanoutSink, PipelineEvent};
use crate::gateway::OracleGateway;
use crate::insights::{
    request_ad_strategy, request_marketing_insights, AdStrategy, MarketingInsights,
};
use crate::logging::UnitLogger;
use crate::materializer::Materializer;
use crate::parser::{parse_candidates, ParseOutcome};
use crate::resolver::resolve;
use crate::selector::select;
use crate::standard::StandardAdapter;
use crate::transitions::{TransitionReport, TransitionSet};
use crate::validator::{Coherence, CoherenceValidator};

/// Which branch of the fallback chain produced a unit's clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTaken {
    Custom,
    Standard,
    Empty,
}

impl PathTaken {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathTaken::Custom => "custom",
            PathTaken::Standard => "standard",
            PathTaken::Empty => "empty",
        }
    }
}

/// Result of one (video, format) unit.
#[derive(Debug, Clone, Serialize)]
pub struct FormatOutcome {
    pub kind: String,
    pub path: PathTaken,
    /// Clips in selection order.
    pub clips: Vec<MaterializedClip>,
    /// Candidates seen across both paths.
    pub candidates: usize,
    /// Candidates dropped before selection.
    pub rejected: usize,
    pub extraction_failures: usize,
    pub transitions_synthesized: bool,
}

impl FormatOutcome {
    fn new(kind: &str, transitions: &TransitionSet) -> Self {
        Self {
            kind: kind.to_string(),
            path: PathTaken::Empty,
            clips: Vec::new(),
            candidates: 0,
            rejected: 0,
            extraction_failures: 0,
            transitions_synthesized: transitions.is_synthesized(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Segment resolution and materialization pipeline.
pub struct Pipeline {
    gateway: OracleGateway,
    extractor: Arc<dyn ClipExtractor>,
    probe: Arc<dyn DurationProbe>,
    config: PipelineConfig,
    sink: Arc<dyn EventSink>,
    ffmpeg_semaphore: Arc<Semaphore>,
    unit_semaphore: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        extractor: Arc<dyn ClipExtractor>,
        probe: Arc<dyn DurationProbe>,
        config: PipelineConfig,
    ) -> Self {
        let gateway = OracleGateway::from_config(oracle, &config);
        let ffmpeg_semaphore = Arc::new(Semaphore::new(config.max_ffmpeg_processes.max(1)));
        let unit_semaphore = Arc::new(Semaphore::new(config.max_concurrent_units.max(1)));
        Self {
            gateway,
            extractor,
            probe,
            config,
            sink: Arc::new(FanoutSink::standard()),
            ffmpeg_semaphore,
            unit_semaphore,
        }
    }

    /// Production wiring: Twelve Labs oracle, FFmpeg extractor, FFprobe probe.
    pub fn from_env(config: PipelineConfig) -> PipelineResult<Self> {
        let oracle = TwelveLabsClient::from_env()?;
        let extractor = FfmpegExtractor::with_timeout(config.extract_timeout.as_secs());
        Ok(Self::new(
            Arc::new(oracle),
            Arc::new(extractor),
            Arc::new(FfprobeProbe),
            config,
        ))
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the oracle gateway (deadline and retry policy).
    pub fn with_gateway(mut self, gateway: OracleGateway) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the shared transition set for `asset`.
    ///
    /// The duration comes from the oracle's answer, or from the probe when
    /// the oracle gives none. Without either the video cannot be cut.
    /// An oracle fault here is not fatal: the probe and the quartile cut
    /// points stand in for the answer.
    pub async fn build_transitions(&self, asset: &AssetRef) -> PipelineResult<TransitionSet> {
        let report = match self
            .gateway
            .generate(asset, &transitions_prompt(), "transitions")
            .await
        {
            Ok(answer) => answer
                .as_deref()
                .map(TransitionReport::parse)
                .unwrap_or_default(),
            Err(e) => {
                self.sink.emit(&PipelineEvent::TransitionsUnavailable {
                    error: e.to_string(),
                });
                TransitionReport::default()
            }
        };

        let duration = match report.video_duration.filter(|d| d.is_finite() && *d > 0.0) {
            Some(duration) => duration,
            None => match self.probe.duration(asset.source_path()).await {
                Ok(duration) => duration,
                Err(e) => {
                    return Err(PipelineError::no_duration(format!(
                        "oracle gave no duration and probe failed: {e}"
                    )))
                }
            },
        };

        let transitions =
            TransitionSet::build(duration, &report.points, self.config.min_transition_importance)?;
        if transitions.is_synthesized() {
            self.sink
                .emit(&PipelineEvent::TransitionsSynthesized { duration });
        }
        debug!(
            asset_id = %asset.video_id,
            duration,
            points = transitions.len(),
            "Transition set built"
        );
        Ok(transitions)
    }

    /// Run a single format.
    pub async fn run_format(&self, asset: &AssetRef, spec: &FormatSpec) -> PipelineResult<FormatOutcome> {
        let transitions = self.build_transitions(asset).await?;
        self.run_format_with(asset, spec, &transitions).await
    }

    /// Run a single format against an existing transition set.
    pub async fn run_format_with(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        transitions: &TransitionSet,
    ) -> PipelineResult<FormatOutcome> {
        self.run_unit(asset, spec, transitions, &ArtifactName::run_token())
            .await
    }

    /// Run several formats concurrently over one video.
    ///
    /// The outer error means the video itself is unusable (no duration).
    /// Inner results are per format, in input order.
    pub async fn run_formats(
        &self,
        asset: &AssetRef,
        specs: &[FormatSpec],
    ) -> PipelineResult<Vec<PipelineResult<FormatOutcome>>> {
        let transitions = self.build_transitions(asset).await?;
        let token = ArtifactName::run_token();

        let futures: Vec<_> = specs
            .iter()
            .map(|spec| {
                let transitions = &transitions;
                let token = token.as_str();
                async move {
                    let _permit = self
                        .unit_semaphore
                        .acquire()
                        .await
                        .map_err(|_| PipelineError::internal("unit semaphore closed"))?;
                    self.run_unit(asset, spec, transitions, token).await
                }
            })
            .collect();

        Ok(join_all(futures).await)
    }

    /// Key-moment highlights in the 15-30 second window.
    pub async fn run_highlights(&self, asset: &AssetRef) -> PipelineResult<FormatOutcome> {
        self.run_format(asset, &FormatSpec::short_highlight()).await
    }

    /// Bumper, non-skippable and skippable ad clips.
    pub async fn run_ads(&self, asset: &AssetRef) -> PipelineResult<Vec<PipelineResult<FormatOutcome>>> {
        self.run_formats(asset, &FormatSpec::ad_formats()).await
    }

    /// Campaign strategy recommendations for the video.
    pub async fn ad_strategy(&self, asset: &AssetRef) -> PipelineResult<AdStrategy> {
        request_ad_strategy(&self.gateway, asset).await
    }

    /// Shorts keywords, hooks and engagement ideas for the video.
    pub async fn marketing_insights(&self, asset: &AssetRef) -> PipelineResult<MarketingInsights> {
        request_marketing_insights(&self.gateway, asset).await
    }

    async fn run_unit(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        transitions: &TransitionSet,
        token: &str,
    ) -> PipelineResult<FormatOutcome> {
        let logger = UnitLogger::new(&asset.video_id, &spec.kind);
        let span = logger.create_span();

        async {
            logger.log_start(&spec.to_string());
            self.sink.emit(&PipelineEvent::UnitStarted {
                kind: spec.kind.clone(),
            });

            match self.run_chain(asset, spec, transitions, token).await {
                Ok(outcome) => {
                    self.sink.emit(&PipelineEvent::UnitCompleted {
                        kind: spec.kind.clone(),
                        path: outcome.path.as_str(),
                        clips: outcome.clips.len(),
                        extraction_failures: outcome.extraction_failures,
                    });
                    logger.log_completion(&format!(
                        "{} clips via {} path",
                        outcome.clips.len(),
                        outcome.path.as_str()
                    ));
                    Ok(outcome)
                }
                Err(e) => {
                    self.sink.emit(&PipelineEvent::UnitFailed {
                        kind: spec.kind.clone(),
                        error: e.to_string(),
                    });
                    logger.log_error(&e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_chain(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        transitions: &TransitionSet,
        token: &str,
    ) -> PipelineResult<FormatOutcome> {
        spec.validate_spec()?;

        let materializer = Materializer::new(
            Arc::clone(&self.extractor),
            Arc::clone(&self.ffmpeg_semaphore),
            self.config.output_dir.clone(),
            self.config.encoding.clone(),
            Arc::clone(&self.sink),
        );
        let mut outcome = FormatOutcome::new(&spec.kind, transitions);

        let segments = self.custom_segments(asset, spec, transitions, &mut outcome).await?;
        let fallback_reason = if segments.is_empty() {
            "no custom candidate survived resolution".to_string()
        } else {
            let report = materializer
                .materialize(asset, spec, select(segments, spec), token)
                .await;
            outcome.extraction_failures += report.failures;
            if !report.segments.is_empty() {
                outcome.path = PathTaken::Custom;
                outcome.clips = to_clips(&report.segments, spec);
                return Ok(outcome);
            }
            "every custom extraction failed".to_string()
        };

        self.sink.emit(&PipelineEvent::FallbackTaken {
            kind: spec.kind.clone(),
            reason: fallback_reason,
        });

        let segments = self
            .standard_segments(asset, spec, transitions, &mut outcome)
            .await?;
        if segments.is_empty() {
            return Ok(outcome);
        }
        let report = materializer
            .materialize(asset, spec, select(segments, spec), token)
            .await;
        outcome.extraction_failures += report.failures;
        if !report.segments.is_empty() {
            outcome.path = PathTaken::Standard;
            outcome.clips = to_clips(&report.segments, spec);
        }
        Ok(outcome)
    }

    /// Ask for format-specific candidates and bring them to Resolved
    /// (or Validated) state.
    async fn custom_segments(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        transitions: &TransitionSet,
        outcome: &mut FormatOutcome,
    ) -> PipelineResult<Vec<Segment>> {
        let answer = self
            .gateway
            .generate(asset, &candidate_prompt(spec), "candidates")
            .await?;

        let parsed = match answer {
            Some(text) => parse_candidates(&text),
            None => ParseOutcome::Degraded("oracle gave no answer".to_string()),
        };
        let candidates = match parsed {
            ParseOutcome::Ok(candidates) => candidates,
            ParseOutcome::Degraded(reason) => {
                self.sink.emit(&PipelineEvent::ParseDegraded {
                    kind: spec.kind.clone(),
                    reason,
                });
                return Ok(Vec::new());
            }
        };
        self.sink.emit(&PipelineEvent::CandidatesParsed {
            kind: spec.kind.clone(),
            origin: "custom",
            count: candidates.len(),
        });
        outcome.candidates += candidates.len();

        let mut segments = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let promoted = Segment::from_candidate(index, candidate, spec, self.config.min_candidate_secs)
                .and_then(|mut segment| {
                    if let Some(duration) = transitions.duration() {
                        segment.ensure_within(duration)?;
                    }
                    let resolved = resolve(segment.start(), segment.end(), spec, transitions);
                    segment.set_bounds(resolved.start, resolved.end)?;
                    segment.mark_resolved()?;
                    Ok((segment, resolved.resolution))
                });
            match promoted {
                Ok((segment, resolution)) => {
                    self.sink.emit(&PipelineEvent::SegmentResolved {
                        kind: spec.kind.clone(),
                        index,
                        resolution,
                    });
                    segments.push(segment);
                }
                Err(e) => {
                    outcome.rejected += 1;
                    self.sink.emit(&PipelineEvent::CandidateRejected {
                        kind: spec.kind.clone(),
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if spec.validate && !segments.is_empty() {
            segments = self.validate_segments(asset, spec, transitions, segments).await;
        }
        Ok(segments)
    }

    async fn validate_segments(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        transitions: &TransitionSet,
        segments: Vec<Segment>,
    ) -> Vec<Segment> {
        let validator = CoherenceValidator::new(self.gateway.clone());
        let reviews = join_all(
            segments
                .iter()
                .map(|s| validator.review(asset, s.start(), s.end(), spec)),
        )
        .await;

        segments
            .into_iter()
            .zip(reviews)
            .map(|(mut segment, coherence)| {
                if let Coherence::Revised { start, end } = coherence {
                    // Revised bounds still have to fit the format.
                    let resolved = resolve(start, end, spec, transitions);
                    match segment.set_bounds(resolved.start, resolved.end) {
                        Ok(()) => self.sink.emit(&PipelineEvent::SegmentRevised {
                            kind: spec.kind.clone(),
                            index: segment.index(),
                            start: resolved.start,
                            end: resolved.end,
                        }),
                        Err(e) => warn!(kind = %spec.kind, error = %e, "Ignoring revised bounds"),
                    }
                }
                if let Err(e) = segment.mark_validated() {
                    warn!(kind = %spec.kind, segment_index = segment.index(), error = %e, "Could not mark validated");
                }
                segment
            })
            .collect()
    }

    /// Fallback: adapt the oracle's generic highlights.
    async fn standard_segments(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        transitions: &TransitionSet,
        outcome: &mut FormatOutcome,
    ) -> PipelineResult<Vec<Segment>> {
        let highlights = self.gateway.summarize(asset).await?.unwrap_or_default();
        self.sink.emit(&PipelineEvent::CandidatesParsed {
            kind: spec.kind.clone(),
            origin: "standard",
            count: highlights.len(),
        });
        if highlights.is_empty() {
            info!(kind = %spec.kind, "No standard highlights available");
            return Ok(Vec::new());
        }

        let adapter = StandardAdapter::new(
            self.gateway.clone(),
            self.config.standard_limit,
            self.config.refine_standard_end,
        );
        let adapted = adapter.adapt(asset, spec, &highlights).await;
        outcome.candidates += adapted.len();

        let mut segments = Vec::with_capacity(adapted.len());
        for (index, result) in adapted.into_iter().enumerate() {
            let result = result.and_then(|segment| match transitions.duration() {
                Some(duration) => segment.ensure_within(duration).map(|()| segment),
                None => Ok(segment),
            });
            match result {
                Ok(segment) => segments.push(segment),
                Err(e) => {
                    outcome.rejected += 1;
                    self.sink.emit(&PipelineEvent::CandidateRejected {
                        kind: spec.kind.clone(),
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(segments)
    }
}

fn to_clips(segments: &[Segment], spec: &FormatSpec) -> Vec<MaterializedClip> {
    segments
        .iter()
        .filter_map(|s| MaterializedClip::from_segment(s, &spec.kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_taken_labels() {
        assert_eq!(PathTaken::Custom.as_str(), "custom");
        assert_eq!(PathTaken::Standard.as_str(), "standard");
        assert_eq!(
            serde_json::to_value(PathTaken::Empty).unwrap(),
            serde_json::json!("empty")
        );
    }

    #[test]
    fn test_new_outcome_is_empty() {
        let set = TransitionSet::build(60.0, &[], None).unwrap();
        let outcome = FormatOutcome::new("bumper", &set);
        assert!(outcome.is_empty());
        assert_eq!(outcome.path, PathTaken::Empty);
        assert!(outcome.transitions_synthesized);
    }
}
