//! Clip extraction.
//!
//! The pipeline talks to [`ClipExtractor`]; [`FfmpegExtractor`] is the
//! production implementation. Stream copy is fast but keyframe-bound, so a
//! crop always forces a re-encode.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use reelcut_models::{CropTransform, EncodingConfig, ExtractMode, FormatSpec};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::crop_filter;

/// Per-clip extraction settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    pub mode: ExtractMode,
    pub encoding: EncodingConfig,
    pub crop: Option<CropTransform>,
}

impl ExtractOptions {
    /// Options for clips of the given format.
    pub fn for_format(spec: &FormatSpec, encoding: EncodingConfig) -> Self {
        Self {
            mode: spec.extract_mode,
            encoding,
            crop: spec.crop,
        }
    }

    /// Mode actually used: filters cannot be applied to copied streams.
    pub fn effective_mode(&self) -> ExtractMode {
        if self.crop.is_some() {
            ExtractMode::Reencode
        } else {
            self.mode
        }
    }
}

/// Cuts `[start, end]` of a source video into a new artifact.
#[async_trait]
pub trait ClipExtractor: Send + Sync {
    async fn extract_clip(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        output: &Path,
        options: &ExtractOptions,
    ) -> MediaResult<()>;
}

/// [`ClipExtractor`] that shells out to FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegExtractor {
    runner: FfmpegRunner,
}

impl FfmpegExtractor {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    /// Extractor whose FFmpeg processes are killed after `secs`.
    pub fn with_timeout(secs: u64) -> Self {
        Self::new(FfmpegRunner::new().with_timeout(secs))
    }
}

#[async_trait]
impl ClipExtractor for FfmpegExtractor {
    async fn extract_clip(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        output: &Path,
        options: &ExtractOptions,
    ) -> MediaResult<()> {
        if !source.exists() {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }
        let cmd = build_extract_command(source, start, end, output, options)?;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(
            "Extracting clip: {} -> {} ({:.2}s-{:.2}s, {})",
            source.display(),
            output.display(),
            start,
            end,
            options.effective_mode()
        );

        self.runner.run(&cmd).await?;

        let produced = tokio::fs::metadata(output)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg produced no output",
                None,
                Some(0),
            ));
        }

        debug!("Clip extracted: {}", output.display());
        Ok(())
    }
}

/// Build the FFmpeg invocation for one clip.
pub fn build_extract_command(
    source: &Path,
    start: f64,
    end: f64,
    output: &Path,
    options: &ExtractOptions,
) -> MediaResult<FfmpegCommand> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
        return Err(MediaError::invalid_range(format!("{start:.3}-{end:.3}")));
    }

    let mode = options.effective_mode();
    let mut cmd = FfmpegCommand::new(source, output)
        .seek(start)
        .duration(end - start);

    if let Some(crop) = options.crop {
        cmd = cmd.video_filter(crop_filter(crop));
    }
    cmd = cmd.output_args(options.encoding.to_ffmpeg_args(mode));
    if mode == ExtractMode::StreamCopy {
        cmd = cmd.avoid_negative_ts();
    }
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_for(options: &ExtractOptions) -> Vec<String> {
        build_extract_command(Path::new("in.mp4"), 12.0, 18.0, Path::new("out.mp4"), options)
            .unwrap()
            .build_args()
    }

    #[test]
    fn test_stream_copy_command() {
        let options = ExtractOptions {
            mode: ExtractMode::StreamCopy,
            ..Default::default()
        };
        let args = args_for(&options);
        assert!(args.windows(2).any(|w| w == ["-ss", "12.000"]));
        assert!(args.windows(2).any(|w| w == ["-t", "6.000"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.contains(&"make_zero".to_string()));
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn test_crop_forces_reencode() {
        let options = ExtractOptions {
            mode: ExtractMode::StreamCopy,
            crop: Some(CropTransform::Vertical916),
            ..Default::default()
        };
        assert_eq!(options.effective_mode(), ExtractMode::Reencode);
        let args = args_for(&options);
        assert!(args.contains(&"-vf".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(!args.contains(&"copy".to_string()));
    }

    #[test]
    fn test_for_format() {
        let spec = FormatSpec::bumper();
        let options = ExtractOptions::for_format(&spec, EncodingConfig::default());
        assert_eq!(options.mode, ExtractMode::StreamCopy);
        assert!(options.crop.is_none());
    }

    #[test]
    fn test_invalid_range() {
        let options = ExtractOptions::default();
        for (start, end) in [(10.0, 10.0), (10.0, 5.0), (-1.0, 5.0), (f64::NAN, 5.0)] {
            let result =
                build_extract_command(Path::new("in.mp4"), start, end, Path::new("out.mp4"), &options);
            assert!(matches!(result, Err(MediaError::InvalidRange(_))));
        }
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = FfmpegExtractor::default()
            .extract_clip(
                &dir.path().join("missing.mp4"),
                0.0,
                5.0,
                &dir.path().join("out.mp4"),
                &ExtractOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
