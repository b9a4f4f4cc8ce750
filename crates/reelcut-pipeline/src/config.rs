//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use reelcut_models::EncodingConfig;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum (video, format) units processed concurrently
    pub max_concurrent_units: usize,
    /// Maximum concurrent FFmpeg processes across all units
    pub max_ffmpeg_processes: usize,
    /// Per-attempt deadline for one oracle call
    pub oracle_timeout: Duration,
    /// Retries for transient oracle failures (not counting the first attempt)
    pub oracle_retries: u32,
    /// Deadline for one FFmpeg extraction
    pub extract_timeout: Duration,
    /// Root directory for produced clips
    pub output_dir: PathBuf,
    /// Candidates shorter than this are rejected before resolution
    pub min_candidate_secs: f64,
    /// Maximum oracle highlights adapted on the fallback path
    pub standard_limit: usize,
    /// Ask the oracle for a natural end point of each fallback highlight
    pub refine_standard_end: bool,
    /// Ignore oracle transitions below this importance
    pub min_transition_importance: Option<f64>,
    /// Settings used when a clip is re-encoded
    pub encoding: EncodingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_units: 2,
            max_ffmpeg_processes: 4,
            oracle_timeout: Duration::from_secs(120),
            oracle_retries: 2,
            extract_timeout: Duration::from_secs(600),
            output_dir: PathBuf::from("/tmp/reelcut"),
            min_candidate_secs: 1.0,
            standard_limit: 5,
            refine_standard_end: true,
            min_transition_importance: None,
            encoding: EncodingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a `.env` file if present, then read the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_units: env_parse("REELCUT_MAX_CONCURRENT_UNITS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_units),
            max_ffmpeg_processes: env_parse("REELCUT_MAX_FFMPEG")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_ffmpeg_processes),
            oracle_timeout: env_parse("REELCUT_ORACLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.oracle_timeout),
            oracle_retries: env_parse("REELCUT_ORACLE_RETRIES").unwrap_or(defaults.oracle_retries),
            extract_timeout: env_parse("REELCUT_EXTRACT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.extract_timeout),
            output_dir: std::env::var("REELCUT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            min_candidate_secs: env_parse("REELCUT_MIN_CANDIDATE_SECS")
                .filter(|s: &f64| s.is_finite() && *s >= 0.0)
                .unwrap_or(defaults.min_candidate_secs),
            standard_limit: env_parse("REELCUT_STANDARD_LIMIT").unwrap_or(defaults.standard_limit),
            refine_standard_end: env_parse("REELCUT_REFINE_STANDARD_END")
                .unwrap_or(defaults.refine_standard_end),
            min_transition_importance: env_parse("REELCUT_MIN_TRANSITION_IMPORTANCE"),
            encoding: defaults.encoding,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_oracle_retries(mut self, retries: u32) -> Self {
        self.oracle_retries = retries;
        self
    }

    pub fn with_refine_standard_end(mut self, refine: bool) -> Self {
        self.refine_standard_end = refine;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
