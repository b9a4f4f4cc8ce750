//! FFprobe duration lookup.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Source of a video's total duration.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the video at `path`, in seconds.
    async fn duration(&self, path: &Path) -> MediaResult<f64>;
}

/// [`DurationProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

#[async_trait]
impl DurationProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        get_duration(path).await
    }
}

/// FFprobe JSON output format (only the parts we read).
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Get video duration in seconds.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_duration_output(&output.stdout)
}

/// Extract a positive duration from ffprobe's `-show_format` JSON.
fn parse_duration_output(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;
    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::InvalidVideo("Missing or zero duration".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        let json = br#"{"format": {"filename": "a.mp4", "duration": "120.480000"}}"#;
        assert!((parse_duration_output(json).unwrap() - 120.48).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_output_missing() {
        assert!(matches!(
            parse_duration_output(br#"{"format": {}}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            parse_duration_output(br#"{"format": {"duration": "0.0"}}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(parse_duration_output(b"not json"), Err(MediaError::JsonParse(_))));
    }

    #[tokio::test]
    async fn test_get_duration_missing_file() {
        let result = get_duration("/nonexistent/video.mp4").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
