//! Ad campaign strategy and Shorts marketing insights.
//!
//! Both are advisory: an answer that cannot be parsed yields a default
//! value, and only hard oracle faults surface as errors.

use serde::{Deserialize, Serialize};
use tracing::warn;

use reelcut_oracle::prompts::{ad_strategy_prompt, marketing_insights_prompt};
use reelcut_oracle::AssetRef;

use crate::error::PipelineResult;
use crate::gateway::OracleGateway;
use crate::parser::extract_json;

/// Campaign strategy suggested for a video.
///
/// Fields the oracle leaves out take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdStrategy {
    pub campaign_objective: String,
    pub audience_segments: Vec<String>,
    pub bidding_strategy: String,
    pub targeting_recommendations: Vec<String>,
    pub performance_metrics: Vec<String>,
}

impl Default for AdStrategy {
    fn default() -> Self {
        Self {
            campaign_objective: "Brand awareness".to_string(),
            audience_segments: vec!["General audience".to_string()],
            bidding_strategy: "Maximize impressions".to_string(),
            targeting_recommendations: vec!["Content targeting".to_string()],
            performance_metrics: vec!["Views".to_string(), "Impressions".to_string()],
        }
    }
}

impl AdStrategy {
    /// Parse the oracle's strategy answer, `None` if it holds no strategy object.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = extract_json(raw)?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

/// Keywords and engagement ideas for short-form publishing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketingInsights {
    #[serde(alias = "seo_keywords")]
    pub shorts_keywords: Vec<String>,
    #[serde(alias = "target_audience")]
    pub shorts_target_audience: String,
    pub shorts_hooks: Vec<String>,
    pub shorts_music_recommendations: Vec<String>,
    pub shorts_engagement_triggers: Vec<String>,
    pub shorts_call_to_actions: Vec<String>,
    pub shorts_popular_formats: Vec<String>,
    pub emotional_triggers: Vec<String>,
}

impl MarketingInsights {
    /// Parse the oracle's insights answer, `None` if it holds no insights object.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = extract_json(raw)?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ask the oracle for a campaign strategy.
///
/// Unusable answers yield [`AdStrategy::default`]; only hard oracle faults
/// are errors.
pub async fn request_ad_strategy(gateway: &OracleGateway, asset: &AssetRef) -> PipelineResult<AdStrategy> {
    let answer = gateway
        .generate(asset, &ad_strategy_prompt(), "ad_strategy")
        .await?;

    let strategy = answer.as_deref().and_then(AdStrategy::parse);
    Ok(strategy.unwrap_or_else(|| {
        warn!(asset_id = %asset.video_id, "Failed to parse strategy response, using default");
        AdStrategy::default()
    }))
}

/// Ask the oracle for Shorts keywords and marketing insights.
///
/// Unusable answers yield an empty [`MarketingInsights`].
pub async fn request_marketing_insights(
    gateway: &OracleGateway,
    asset: &AssetRef,
) -> PipelineResult<MarketingInsights> {
    let answer = gateway
        .generate(asset, &marketing_insights_prompt(), "marketing_insights")
        .await?;

    let insights = answer.as_deref().and_then(MarketingInsights::parse);
    Ok(insights.unwrap_or_else(|| {
        warn!(asset_id = %asset.video_id, "Failed to parse marketing insights, using empty set");
        MarketingInsights::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelcut_oracle::{HighlightSummary, Oracle, OracleError, OracleResult};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::PipelineError;

    #[test]
    fn test_parse_full_strategy() {
        let raw = r#"```json
{
  "campaign_objective": "Lead generation",
  "audience_segments": ["Developers", "CTOs"],
  "bidding_strategy": "Target CPA",
  "targeting_recommendations": ["Tech channels"],
  "performance_metrics": ["Conversions"]
}
```"#;
        let strategy = AdStrategy::parse(raw).unwrap();
        assert_eq!(strategy.campaign_objective, "Lead generation");
        assert_eq!(strategy.audience_segments, vec!["Developers", "CTOs"]);
        assert_eq!(strategy.performance_metrics, vec!["Conversions"]);
    }

    #[test]
    fn test_parse_partial_fills_defaults() {
        let strategy = AdStrategy::parse(r#"{"bidding_strategy": "Target ROAS"}"#).unwrap();
        assert_eq!(strategy.bidding_strategy, "Target ROAS");
        assert_eq!(strategy.campaign_objective, "Brand awareness");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AdStrategy::parse("I would suggest brand awareness.").is_none());
        assert!(AdStrategy::parse(r#"{"audience_segments": "everyone"}"#).is_none());
    }

    struct StrategyOracle(Result<&'static str, u16>);

    #[async_trait]
    impl Oracle for StrategyOracle {
        async fn generate_text(&self, _asset: &AssetRef, _prompt: &str) -> OracleResult<String> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(OracleError::Http {
                    status,
                    body: String::new(),
                }),
            }
        }

        async fn summarize_highlights(&self, _asset: &AssetRef) -> OracleResult<Vec<HighlightSummary>> {
            Ok(vec![])
        }
    }

    fn gateway(oracle: StrategyOracle) -> OracleGateway {
        OracleGateway::new(Arc::new(oracle), Duration::from_secs(5), 0)
    }

    #[tokio::test]
    async fn test_unparsable_answer_uses_default() {
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let strategy = request_ad_strategy(&gateway(StrategyOracle(Ok("no idea"))), &asset)
            .await
            .unwrap();
        assert_eq!(strategy, AdStrategy::default());
    }

    #[tokio::test]
    async fn test_client_error_uses_default() {
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let strategy = request_ad_strategy(&gateway(StrategyOracle(Err(400))), &asset)
            .await
            .unwrap();
        assert_eq!(strategy, AdStrategy::default());
    }

    #[tokio::test]
    async fn test_hard_fault_propagates() {
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let result = request_ad_strategy(&gateway(StrategyOracle(Err(401))), &asset).await;
        assert!(matches!(result, Err(PipelineError::Oracle(_))));
    }

    #[test]
    fn test_parse_marketing_insights() {
        let raw = r#"Here you go:
{
  "shorts_keywords": ["unboxing", "tech"],
  "target_audience": "Gadget fans",
  "shorts_hooks": ["Wait for it"],
  "emotional_triggers": ["curiosity"]
}"#;
        let insights = MarketingInsights::parse(raw).unwrap();
        assert_eq!(insights.shorts_keywords, vec!["unboxing", "tech"]);
        assert_eq!(insights.shorts_target_audience, "Gadget fans");
        assert_eq!(insights.shorts_hooks, vec!["Wait for it"]);
        assert!(insights.shorts_call_to_actions.is_empty());
        assert!(!insights.is_empty());
    }

    #[test]
    fn test_parse_marketing_insights_rejects_garbage() {
        assert!(MarketingInsights::parse("Use trending sounds.").is_none());
        assert!(MarketingInsights::parse(r#"["a", "b"]"#).is_none());
    }

    #[tokio::test]
    async fn test_unparsable_insights_are_empty() {
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let insights = request_marketing_insights(&gateway(StrategyOracle(Ok("keywords: fun"))), &asset)
            .await
            .unwrap();
        assert!(insights.is_empty());
    }

    #[tokio::test]
    async fn test_insights_hard_fault_propagates() {
        let asset = AssetRef::new("vid", "/tmp/vid.mp4");
        let result = request_marketing_insights(&gateway(StrategyOracle(Err(503))), &asset).await;
        assert!(matches!(result, Err(PipelineError::Oracle(_))));
    }
}
