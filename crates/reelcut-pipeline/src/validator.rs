//! Coherence validation pass.
//!
//! Asks the oracle whether a resolved interval stands on its own and
//! accepts revised bounds when it offers usable ones. The pass can only
//! improve a segment: every failure mode leaves it unchanged.

use tracing::{debug, warn};

use reelcut_models::timestamp::seconds_from_value;
use reelcut_models::FormatSpec;
use reelcut_oracle::prompts::coherence_prompt;
use reelcut_oracle::AssetRef;

use crate::gateway::OracleGateway;
use crate::parser::extract_json;

/// Revisions smaller than this are ignored.
const REVISION_EPSILON: f64 = 1e-6;

/// Outcome of a coherence check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coherence {
    Unchanged,
    Revised { start: f64, end: f64 },
}

impl Coherence {
    /// Interpret the oracle's answer for the interval `[start, end]`.
    ///
    /// A revision requires both bounds to parse as numbers with
    /// `end > start`. Anything else is informational only.
    pub fn parse(raw: &str, start: f64, end: f64) -> Self {
        let Some(value) = extract_json(raw) else {
            return Coherence::Unchanged;
        };
        let (Some(new_start), Some(new_end)) = (
            bound(&value, &["start_time", "start"]),
            bound(&value, &["end_time", "end"]),
        ) else {
            return Coherence::Unchanged;
        };

        if new_end <= new_start {
            return Coherence::Unchanged;
        }
        if (new_start - start).abs() < REVISION_EPSILON && (new_end - end).abs() < REVISION_EPSILON {
            return Coherence::Unchanged;
        }
        Coherence::Revised {
            start: new_start,
            end: new_end,
        }
    }
}

fn bound(value: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(seconds_from_value))
}

/// Runs the coherence check through the oracle.
#[derive(Clone)]
pub struct CoherenceValidator {
    gateway: OracleGateway,
}

impl CoherenceValidator {
    pub fn new(gateway: OracleGateway) -> Self {
        Self { gateway }
    }

    /// Review `[start, end]`. Oracle errors and timeouts yield `Unchanged`.
    pub async fn review(&self, asset: &AssetRef, start: f64, end: f64, spec: &FormatSpec) -> Coherence {
        let prompt = coherence_prompt(start, end, spec);
        match self.gateway.generate(asset, &prompt, "coherence_check").await {
            Ok(Some(answer)) => {
                let coherence = Coherence::parse(&answer, start, end);
                debug!(kind = %spec.kind, start, end, ?coherence, "Coherence reviewed");
                coherence
            }
            Ok(None) => Coherence::Unchanged,
            Err(e) => {
                warn!(kind = %spec.kind, error = %e, "Coherence check failed, keeping interval");
                Coherence::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelcut_oracle::{HighlightSummary, Oracle, OracleError, OracleResult};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_parse_revision() {
        let raw = r#"{"coherent": false, "start_time": 22, "end_time": 38.5, "reason": "cut mid-sentence"}"#;
        assert_eq!(
            Coherence::parse(raw, 23.0, 40.0),
            Coherence::Revised { start: 22.0, end: 38.5 }
        );
    }

    #[test]
    fn test_parse_unchanged_cases() {
        // Same bounds
        assert_eq!(
            Coherence::parse(r#"{"coherent": true, "start_time": 23, "end_time": 40}"#, 23.0, 40.0),
            Coherence::Unchanged
        );
        // Inverted bounds
        assert_eq!(
            Coherence::parse(r#"{"start_time": 40, "end_time": 23}"#, 23.0, 40.0),
            Coherence::Unchanged
        );
        // Non-numeric bound
        assert_eq!(
            Coherence::parse(r#"{"start_time": "earlier", "end_time": 41}"#, 23.0, 40.0),
            Coherence::Unchanged
        );
        // Informational only
        assert_eq!(Coherence::parse(r#"{"coherent": true}"#, 23.0, 40.0), Coherence::Unchanged);
        assert_eq!(Coherence::parse("Looks fine to me.", 23.0, 40.0), Coherence::Unchanged);
    }

    struct FixedOracle(OracleResult<String>);

    #[async_trait]
    impl Oracle for FixedOracle {
        async fn generate_text(&self, _asset: &AssetRef, _prompt: &str) -> OracleResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(OracleError::Network("connection refused".into())),
            }
        }

        async fn summarize_highlights(&self, _asset: &AssetRef) -> OracleResult<Vec<HighlightSummary>> {
            Ok(vec![])
        }
    }

    fn validator(oracle: FixedOracle) -> CoherenceValidator {
        CoherenceValidator::new(OracleGateway::new(Arc::new(oracle), Duration::from_secs(5), 0))
    }

    #[tokio::test]
    async fn test_review_applies_oracle_answer() {
        let v = validator(FixedOracle(Ok(r#"{"start_time": 24, "end_time": 39}"#.into())));
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let coherence = v.review(&asset, 23.0, 40.0, &FormatSpec::new("t", 15.0, 2.0)).await;
        assert_eq!(coherence, Coherence::Revised { start: 24.0, end: 39.0 });
    }

    #[tokio::test]
    async fn test_review_hard_fault_is_unchanged() {
        let v = validator(FixedOracle(Err(OracleError::Network(String::new()))));
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let coherence = v.review(&asset, 23.0, 40.0, &FormatSpec::new("t", 15.0, 2.0)).await;
        assert_eq!(coherence, Coherence::Unchanged);
    }
}
