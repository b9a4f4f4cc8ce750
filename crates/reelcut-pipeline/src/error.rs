//! Pipeline error types.

use thiserror::Error;

use reelcut_media::MediaError;
use reelcut_models::{FormatSpecError, SegmentError};
use reelcut_oracle::OracleError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a unit of work.
///
/// Degraded oracle answers and per-segment failures are not errors; they
/// route to the fallback path or drop the segment.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] FormatSpecError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Segment error: {0}")]
    Segment(#[from] SegmentError),

    #[error("No usable video duration: {0}")]
    NoDuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn no_duration(msg: impl Into<String>) -> Self {
        Self::NoDuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
