//! FFmpeg CLI wrapper for clip extraction.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with timeout and stderr capture
//! - The [`ClipExtractor`] and [`DurationProbe`] boundaries used by the pipeline

pub mod clip;
pub mod command;
pub mod error;
pub mod filters;
pub mod probe;

pub use clip::{ClipExtractor, ExtractOptions, FfmpegExtractor};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, DurationProbe, FfprobeProbe};
