//! Shared data models for the reelcut segment pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Output format specifications (duration, tolerance, extraction options)
//! - Raw oracle candidates and resolved segments
//! - Materialized clip records handed to result consumers
//! - Timestamp parsing and encoding configuration

pub mod candidate;
pub mod clip;
pub mod encoding;
pub mod format;
pub mod segment;
pub mod timestamp;

// Re-export common types
pub use candidate::RawCandidate;
pub use clip::{sanitize_label, ArtifactName, MaterializedClip};
pub use encoding::{EncodingConfig, ExtractMode};
pub use format::{CropTransform, FormatSpec, FormatSpecError, PromptKind};
pub use segment::{Segment, SegmentError, SegmentOrigin, SegmentState};
pub use timestamp::{parse_timestamp, TimestampError};
