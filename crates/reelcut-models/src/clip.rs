//! Materialized clip records and artifact naming.

use std::path::PathBuf;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::segment::{Segment, SegmentOrigin, SegmentState};

/// Maximum slug length in artifact file names.
pub const MAX_SLUG_LEN: usize = 30;

/// Final output record for one extracted clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MaterializedClip {
    /// Format tag the clip was produced for.
    pub kind: String,
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub artifact_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub origin: SegmentOrigin,

    // Ad creative fields, when the oracle supplied them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

impl MaterializedClip {
    /// Build the record for a materialized segment.
    ///
    /// Returns `None` unless the segment is in the `Materialized` state.
    pub fn from_segment(segment: &Segment, kind: &str) -> Option<Self> {
        if segment.state() != SegmentState::Materialized {
            return None;
        }
        let artifact_path = segment.artifact_path()?.to_path_buf();
        let extra = |key: &str| {
            segment
                .extra()
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Some(Self {
            kind: kind.to_string(),
            label: segment.label().to_string(),
            start: segment.start(),
            end: segment.end(),
            artifact_path,
            score: segment.score(),
            origin: segment.origin(),
            headline: extra("headline"),
            call_to_action: extra("call_to_action"),
            target_audience: extra("target_audience"),
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Unique artifact file name for one clip.
///
/// Renders as `{kind}_{ordinal:02}_{duration}s_{slug}_{token}.mp4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub kind: String,
    pub ordinal: usize,
    pub duration_secs: u64,
    pub slug: String,
    pub token: String,
}

impl ArtifactName {
    pub fn new(kind: &str, ordinal: usize, duration: f64, label: &str, token: impl Into<String>) -> Self {
        Self {
            kind: sanitize_label(kind),
            ordinal,
            duration_secs: duration.max(0.0).round() as u64,
            slug: sanitize_label(label),
            token: token.into(),
        }
    }

    /// Per-run token: UTC timestamp plus a short random suffix.
    pub fn run_token() -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{}_{}", Utc::now().format("%Y%m%d%H%M%S"), &id[..8])
    }

    pub fn file_name(&self) -> String {
        let slug = if self.slug.is_empty() { "clip" } else { &self.slug };
        format!(
            "{}_{:02}_{}s_{}_{}.mp4",
            self.kind, self.ordinal, self.duration_secs, slug, self.token
        )
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Make a label safe for use in a file name.
///
/// Keeps ASCII alphanumerics and spaces, joins words with `_` and truncates
/// to [`MAX_SLUG_LEN`] characters.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_SLUG_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("Hello World!"), "Hello_World");
        assert_eq!(sanitize_label("  spaced   out  "), "spaced_out");
        assert_eq!(sanitize_label("café/../etc"), "cafetc");
        assert_eq!(sanitize_label(""), "");
        assert_eq!(sanitize_label(&"a".repeat(80)).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_artifact_file_name() {
        let name = ArtifactName::new("bumper", 1, 6.0, "Big reveal!", "20240101120000_abcd1234");
        assert_eq!(name.file_name(), "bumper_01_6s_Big_reveal_20240101120000_abcd1234.mp4");
    }

    #[test]
    fn test_artifact_file_name_empty_label() {
        let name = ArtifactName::new("non-skippable", 3, 14.6, "???", "t");
        assert_eq!(name.file_name(), "nonskippable_03_15s_clip_t.mp4");
    }

    #[test]
    fn test_run_tokens_differ() {
        assert_ne!(ArtifactName::run_token(), ArtifactName::run_token());
    }

    #[test]
    fn test_from_segment_requires_materialized() {
        let mut extra = Map::new();
        extra.insert("headline".into(), Value::String("Act now".into()));
        let mut seg = Segment::new(0, 10.0, 16.0, "Opening", SegmentOrigin::Custom)
            .unwrap()
            .with_score(7.0)
            .with_extra(extra);
        assert!(MaterializedClip::from_segment(&seg, "bumper").is_none());

        seg.mark_resolved().unwrap();
        seg.materialize("/out/bumper.mp4").unwrap();
        let clip = MaterializedClip::from_segment(&seg, "bumper").unwrap();
        assert_eq!(clip.kind, "bumper");
        assert_eq!(clip.duration(), 6.0);
        assert_eq!(clip.score, Some(7.0));
        assert_eq!(clip.headline.as_deref(), Some("Act now"));
        assert!(clip.call_to_action.is_none());
    }
}
