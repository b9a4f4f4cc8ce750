//! Standard-highlight adaptation for the fallback path.
//!
//! The oracle's generic highlight summary only gives a start (and sometimes
//! an end) per highlight. Each highlight is turned into a resolved segment
//! whose duration lies inside the format's acceptable range.

use futures::future::join_all;
use tracing::debug;

use reelcut_models::timestamp::seconds_from_value;
use reelcut_models::{FormatSpec, Segment, SegmentError, SegmentOrigin};
use reelcut_oracle::prompts::natural_end_prompt;
use reelcut_oracle::{AssetRef, HighlightSummary};

use crate::gateway::OracleGateway;
use crate::parser::extract_json;

/// Score given to every standard highlight.
pub const STANDARD_SCORE: f64 = 8.0;

/// Adapts oracle highlights into segments.
#[derive(Clone)]
pub struct StandardAdapter {
    gateway: OracleGateway,
    limit: usize,
    refine_end: bool,
}

impl StandardAdapter {
    pub fn new(gateway: OracleGateway, limit: usize, refine_end: bool) -> Self {
        Self {
            gateway,
            limit,
            refine_end,
        }
    }

    /// Adapt at most `limit` highlights, in summary order.
    ///
    /// Each entry is either a resolved segment or the reason the highlight
    /// could not become one.
    pub async fn adapt(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        highlights: &[HighlightSummary],
    ) -> Vec<Result<Segment, SegmentError>> {
        let futures = highlights
            .iter()
            .take(self.limit)
            .enumerate()
            .map(|(index, highlight)| async move {
                let proposed_end = self.proposed_end(asset, spec, highlight).await;
                let end = bound_end(highlight.start, proposed_end, spec);
                let mut segment =
                    Segment::new(index, highlight.start, end, highlight.text.clone(), SegmentOrigin::Standard)?
                        .with_score(STANDARD_SCORE);
                segment.mark_resolved()?;
                Ok::<_, SegmentError>(segment)
            });
        join_all(futures).await
    }

    async fn proposed_end(&self, asset: &AssetRef, spec: &FormatSpec, highlight: &HighlightSummary) -> f64 {
        let fallback = highlight.start + spec.target_duration;
        if !self.refine_end {
            return highlight.end.unwrap_or(fallback);
        }

        let prompt = natural_end_prompt(highlight.start, spec);
        match self.gateway.generate(asset, &prompt, "natural_end").await {
            Ok(Some(answer)) => parse_end_time(&answer).unwrap_or_else(|| {
                debug!(kind = %spec.kind, start = highlight.start, "No usable natural end, using target");
                fallback
            }),
            _ => fallback,
        }
    }
}

/// Parse `{"end_time": s}` from an oracle answer.
pub fn parse_end_time(raw: &str) -> Option<f64> {
    let value = extract_json(raw)?;
    ["end_time", "end"]
        .iter()
        .find_map(|k| value.get(*k).and_then(seconds_from_value))
}

/// Bring `end` inside the acceptable range of `spec` measured from `start`.
///
/// Too short becomes `start + min` (or `start + target` when the minimum is
/// zero), too long becomes `start + max`.
pub fn bound_end(start: f64, end: f64, spec: &FormatSpec) -> f64 {
    let (min, max) = spec.acceptable_range();
    let duration = end - start;
    if !duration.is_finite() || duration <= 0.0 {
        return start + spec.target_duration;
    }
    if duration < min {
        return start + if min > 0.0 { min } else { spec.target_duration };
    }
    if duration > max {
        return start + max;
    }
    end
}
