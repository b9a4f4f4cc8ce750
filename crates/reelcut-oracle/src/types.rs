//! Oracle request and response types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A video known both to the oracle (by id) and locally (by path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    /// Oracle-side video id.
    pub video_id: String,
    /// Local source file the extractor reads from.
    pub source_path: PathBuf,
}

impl AssetRef {
    pub fn new(video_id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            video_id: video_id.into(),
            source_path: source_path.into(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

/// One entry of the oracle's generic highlight summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSummary {
    #[serde(alias = "highlight")]
    pub text: String,
    pub start: f64,
    #[serde(default)]
    pub end: Option<f64>,
}

impl HighlightSummary {
    pub fn new(text: impl Into<String>, start: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end: None,
        }
    }
}
