//! Prompt builders for every question the pipeline asks the oracle.
//!
//! Each prompt names the JSON shape the parser expects back. The oracle
//! does not always comply; callers never rely on it.

use reelcut_models::{FormatSpec, PromptKind};

/// Candidate request for a format, dispatched on its prompt kind.
pub fn candidate_prompt(spec: &FormatSpec) -> String {
    match spec.prompt {
        PromptKind::AdSegment => ad_segment_prompt(spec),
        PromptKind::KeyMoments => key_moments_prompt(spec),
    }
}

/// Ask for the single best ad segment of exactly the target length.
pub fn ad_segment_prompt(spec: &FormatSpec) -> String {
    let secs = fmt_secs(spec.target_duration);
    format!(
        r#"Identify the best {secs}-second segment for a Google {kind} ad.

Return JSON format:
{{
  "ad_segment": {{
    "headline": "compelling headline (<30 chars)",
    "description": "ad description (<90 chars)",
    "call_to_action": "clear CTA (<15 chars)",
    "target_audience": "specific audience segment",
    "start_time": start_time_in_seconds,
    "end_time": start_time_in_seconds + {secs}
  }}
}}

SELECTION CRITERIA:
- EXACTLY {secs} seconds long
- Clear value proposition in first 3 seconds
- Complete narrative arc
- No distracting elements
- Follows Google Ads guidelines
- Strong hook and clear CTA"#,
        kind = spec.kind,
    )
}

/// Ask for the most important moments, ranked, inside the format's window.
pub fn key_moments_prompt(spec: &FormatSpec) -> String {
    let (min, max) = spec.acceptable_range();
    format!(
        r#"Find the {count} most important moments in this video that would be valuable for viewers or marketing.
For each moment:
1. Identify a natural segment with clear beginning and end points
2. Ensure the segment contains complete thoughts and coherent content
3. Focus on the most informative, engaging, or persuasive parts
4. Vary your selections to capture different aspects of the video
5. Each segment should be between {min}-{max} seconds long

Return your analysis in JSON format:
{{
    "key_moments": [
        {{
            "description": "Clear description of what makes this moment important",
            "start_time": start_time_in_seconds,
            "end_time": end_time_in_seconds,
            "importance_score": score_from_1_to_10,
            "key_takeaway": "The main point or value of this segment"
        }}
    ]
}}"#,
        count = spec.max_segments,
        min = fmt_secs(min),
        max = fmt_secs(max),
    )
}

/// Ask for the video's natural cut points.
pub fn transitions_prompt() -> String {
    r#"List the natural transition points in this video: scene changes, topic shifts, and pauses between complete thoughts.

Return JSON format:
{
  "video_duration": total_duration_in_seconds,
  "transitions": [
    {"time": time_in_seconds, "importance": score_from_1_to_10}
  ]
}"#
    .to_string()
}

/// Ask where a thought that starts at `start` naturally completes.
pub fn natural_end_prompt(start: f64, spec: &FormatSpec) -> String {
    let (min, max) = spec.acceptable_range();
    format!(
        r#"A key moment in this video starts at {start} seconds.
Find the natural ending point for this segment where the thought or idea completes.
The segment should be between {min}-{max} seconds for optimal engagement.

Return only: {{"end_time": natural_end_time_in_seconds}}"#,
        start = fmt_secs(start),
        min = fmt_secs(min),
        max = fmt_secs(max),
    )
}

/// Ask whether `[start, end]` stands alone, with optional adjusted bounds.
pub fn coherence_prompt(start: f64, end: f64, spec: &FormatSpec) -> String {
    format!(
        r#"Review the segment from {start} to {end} seconds, intended as a {target}-second {kind} clip.
Does it form a coherent standalone unit: no sentence cut mid-way, a clear beginning and a clear ending?
If not, suggest adjusted bounds that keep the length close to {target} seconds.

Return JSON format:
{{
  "coherent": true_or_false,
  "start_time": adjusted_start_in_seconds,
  "end_time": adjusted_end_in_seconds,
  "reason": "short explanation"
}}"#,
        start = fmt_secs(start),
        end = fmt_secs(end),
        target = fmt_secs(spec.target_duration),
        kind = spec.kind,
    )
}

/// Ask for ad campaign strategy recommendations.
pub fn ad_strategy_prompt() -> String {
    r#"Provide Google Ads campaign strategy recommendations in JSON:
{
  "campaign_objective": "primary objective",
  "audience_segments": ["segment1", "segment2", "segment3"],
  "bidding_strategy": "recommended strategy",
  "targeting_recommendations": ["recommendation1", "recommendation2"],
  "performance_metrics": ["key metric1", "key metric2"]
}

Focus on:
1. Clear campaign objective based on content
2. Specific audience segmentation
3. Appropriate bidding strategy
4. Targeting recommendations
5. Key performance metrics to track"#
        .to_string()
}

/// Ask for YouTube Shorts keywords and marketing insights.
pub fn marketing_insights_prompt() -> String {
    r#"Provide JSON with:
{
  "shorts_keywords": ["keyword1", "keyword2", "keyword3"],
  "shorts_target_audience": "description",
  "shorts_hooks": ["hook1", "hook2"],
  "shorts_music_recommendations": ["sound1", "sound2"],
  "shorts_engagement_triggers": ["prompt1", "prompt2"],
  "shorts_call_to_actions": ["CTA1"],
  "shorts_popular_formats": ["format1"],
  "emotional_triggers": ["trigger1"]
}
Focus on YouTube Shorts performance metrics."#
        .to_string()
}

/// Whole seconds print without a fractional part.
fn fmt_secs(secs: f64) -> String {
    if secs.fract().abs() < 1e-9 {
        format!("{}", secs as i64)
    } else {
        format!("{:.1}", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ad_segment_prompt_mentions_duration() {
        let prompt = ad_segment_prompt(&FormatSpec::bumper());
        assert!(prompt.contains("best 6-second segment for a Google bumper ad"));
        assert!(prompt.contains("\"ad_segment\""));
        assert!(prompt.contains("EXACTLY 6 seconds"));
    }

    #[test]
    fn test_candidate_prompt_dispatch() {
        let highlight = FormatSpec::short_highlight();
        let prompt = candidate_prompt(&highlight);
        assert!(prompt.contains("\"key_moments\""));
        assert!(prompt.contains("Find the 3 most important"));
        assert!(prompt.contains("between 15-30 seconds"));

        assert!(candidate_prompt(&FormatSpec::skippable()).contains("\"ad_segment\""));
    }

    #[test]
    fn test_natural_end_prompt() {
        let prompt = natural_end_prompt(42.5, &FormatSpec::short_highlight());
        assert!(prompt.contains("starts at 42.5 seconds"));
        assert!(prompt.contains("\"end_time\""));
    }

    #[test]
    fn test_marketing_insights_prompt_lists_fields() {
        let prompt = marketing_insights_prompt();
        for field in ["\"shorts_keywords\"", "\"shorts_hooks\"", "\"emotional_triggers\""] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_fmt_secs() {
        assert_eq!(fmt_secs(15.0), "15");
        assert_eq!(fmt_secs(22.5), "22.5");
    }
}
