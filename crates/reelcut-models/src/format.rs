//! Output format specifications.
//!
//! A [`FormatSpec`] describes one desired output style: how long each clip
//! must be, how far it may deviate, and how the pipeline should treat it
//! (which prompt to send, whether to run a validation pass, how to cut).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::encoding::ExtractMode;

/// Which response shape the custom-candidate prompt asks the oracle for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// A single `ad_segment` object with ad copy fields.
    AdSegment,
    /// A `key_moments` list ranked by importance.
    #[default]
    KeyMoments,
}

/// Optional spatial transform applied while extracting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CropTransform {
    /// Center 9:16 slice scaled to 1080x1920.
    Vertical916,
    /// Center 1:1 slice scaled to 1080x1080.
    CenterSquare,
}

impl CropTransform {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropTransform::Vertical916 => "vertical_9_16",
            CropTransform::CenterSquare => "center_square",
        }
    }
}

impl fmt::Display for CropTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid format specification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatSpecError {
    #[error("Format kind cannot be empty")]
    EmptyKind,

    #[error("Target duration must be positive and finite, got {0}")]
    InvalidTargetDuration(f64),

    #[error("Tolerance must be non-negative and finite, got {0}")]
    InvalidTolerance(f64),

    #[error("max_segments must be at least 1")]
    ZeroSegments,
}

/// One desired output style. Immutable once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormatSpec {
    /// Format tag, e.g. "bumper" or "highlight". Used in filenames and logs.
    pub kind: String,

    /// Desired clip length in seconds.
    pub target_duration: f64,

    /// Allowed deviation from `target_duration` in seconds.
    #[serde(default)]
    pub tolerance: f64,

    /// Response shape requested from the oracle.
    #[serde(default)]
    pub prompt: PromptKind,

    /// Maximum number of clips produced for this format.
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,

    /// Stream copy or re-encode at extraction time.
    #[serde(default)]
    pub extract_mode: ExtractMode,

    /// Optional crop applied at extraction time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropTransform>,

    /// Run the coherence validation pass on resolved segments.
    #[serde(default)]
    pub validate: bool,

    /// Reject selections that overlap a higher-ranked segment.
    #[serde(default)]
    pub exclusive: bool,
}

fn default_max_segments() -> usize {
    1
}

impl FormatSpec {
    /// Create a format with the given duration window and default options.
    pub fn new(kind: impl Into<String>, target_duration: f64, tolerance: f64) -> Self {
        Self {
            kind: kind.into(),
            target_duration,
            tolerance,
            prompt: PromptKind::default(),
            max_segments: default_max_segments(),
            extract_mode: ExtractMode::default(),
            crop: None,
            validate: false,
            exclusive: false,
        }
    }

    /// 6-second Google bumper ad.
    pub fn bumper() -> Self {
        Self::ad("bumper", 6.0)
    }

    /// 15-second non-skippable in-stream ad.
    pub fn non_skippable() -> Self {
        Self::ad("non-skippable", 15.0)
    }

    /// 30-second skippable in-stream ad.
    pub fn skippable() -> Self {
        Self::ad("skippable", 30.0)
    }

    /// All ad formats, in the order they are usually requested.
    pub fn ad_formats() -> Vec<Self> {
        vec![Self::bumper(), Self::non_skippable(), Self::skippable()]
    }

    /// 15-30 second key-moment highlight, re-encoded for precise cuts.
    pub fn short_highlight() -> Self {
        Self {
            max_segments: 3,
            ..Self::new("highlight", 22.5, 7.5)
        }
    }

    fn ad(kind: &str, seconds: f64) -> Self {
        // Ads must be (near) exact; rounding to the nearest second is accepted.
        Self {
            prompt: PromptKind::AdSegment,
            extract_mode: ExtractMode::StreamCopy,
            ..Self::new(kind, seconds, 0.5)
        }
    }

    pub fn with_max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments;
        self
    }

    pub fn with_prompt(mut self, prompt: PromptKind) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_extract_mode(mut self, mode: ExtractMode) -> Self {
        self.extract_mode = mode;
        self
    }

    pub fn with_crop(mut self, crop: CropTransform) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Check numeric invariants.
    pub fn validate_spec(&self) -> Result<(), FormatSpecError> {
        if self.kind.trim().is_empty() {
            return Err(FormatSpecError::EmptyKind);
        }
        if !self.target_duration.is_finite() || self.target_duration <= 0.0 {
            return Err(FormatSpecError::InvalidTargetDuration(self.target_duration));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(FormatSpecError::InvalidTolerance(self.tolerance));
        }
        if self.max_segments == 0 {
            return Err(FormatSpecError::ZeroSegments);
        }
        Ok(())
    }

    /// Inclusive duration window `(min, max)`. The lower bound never drops below zero.
    pub fn acceptable_range(&self) -> (f64, f64) {
        (
            (self.target_duration - self.tolerance).max(0.0),
            self.target_duration + self.tolerance,
        )
    }

    /// Absolute deviation of `duration` from the target.
    pub fn deviation(&self, duration: f64) -> f64 {
        (duration - self.target_duration).abs()
    }

    /// Whether `duration` is within tolerance of the target.
    pub fn accepts(&self, duration: f64) -> bool {
        // Small epsilon so values computed from float timestamps at the edge pass.
        self.deviation(duration) <= self.tolerance + 1e-9
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}s ±{}s)", self.kind, self.target_duration, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ad_presets() {
        let formats = FormatSpec::ad_formats();
        let durations: Vec<f64> = formats.iter().map(|f| f.target_duration).collect();
        assert_eq!(durations, vec![6.0, 15.0, 30.0]);
        assert!(formats.iter().all(|f| f.prompt == PromptKind::AdSegment));
        assert!(formats.iter().all(|f| f.extract_mode == ExtractMode::StreamCopy));
    }

    #[test]
    fn test_short_highlight_window() {
        let spec = FormatSpec::short_highlight();
        assert_eq!(spec.acceptable_range(), (15.0, 30.0));
        assert!(spec.accepts(15.0));
        assert!(spec.accepts(30.0));
        assert!(!spec.accepts(30.5));
        assert_eq!(spec.extract_mode, ExtractMode::Reencode);
    }

    #[test]
    fn test_zero_tolerance_accepts_exact_only() {
        let spec = FormatSpec::new("exact", 15.0, 0.0);
        assert!(spec.accepts(15.0));
        assert!(!spec.accepts(15.1));
    }

    #[test]
    fn test_validate_spec() {
        assert!(FormatSpec::bumper().validate_spec().is_ok());
        assert_eq!(
            FormatSpec::new("x", 0.0, 1.0).validate_spec(),
            Err(FormatSpecError::InvalidTargetDuration(0.0))
        );
        assert_eq!(
            FormatSpec::new("x", 10.0, -1.0).validate_spec(),
            Err(FormatSpecError::InvalidTolerance(-1.0))
        );
        assert_eq!(
            FormatSpec::new(" ", 10.0, 1.0).validate_spec(),
            Err(FormatSpecError::EmptyKind)
        );
        assert_eq!(
            FormatSpec::new("x", 10.0, 1.0).with_max_segments(0).validate_spec(),
            Err(FormatSpecError::ZeroSegments)
        );
    }

    #[test]
    fn test_deserialize_minimal() {
        let spec: FormatSpec =
            serde_json::from_str(r#"{"kind":"promo","target_duration":20,"tolerance":2}"#).unwrap();
        assert_eq!(spec.max_segments, 1);
        assert_eq!(spec.prompt, PromptKind::KeyMoments);
        assert!(!spec.validate);
        assert!(spec.crop.is_none());
    }
}
