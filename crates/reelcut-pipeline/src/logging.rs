//! Tracing setup and structured per-unit logging.

use tracing::{error, info, Span};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directives added on top of `RUST_LOG`.
const DEFAULT_DIRECTIVES: &[&str] = &["reelcut=info", "hyper=warn", "reqwest=warn"];

/// Install the global tracing subscriber.
///
/// JSON output when `LOG_FORMAT=json`, colored human output otherwise.
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> Result<(), TryInitError> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = DEFAULT_DIRECTIVES
        .iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    }
}

/// Logger for one (video, format) unit of work.
///
/// Every record carries the asset id and format kind.
#[derive(Debug, Clone)]
pub struct UnitLogger {
    asset_id: String,
    format_kind: String,
}

impl UnitLogger {
    pub fn new(asset_id: &str, format_kind: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            format_kind: format_kind.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            asset_id = %self.asset_id,
            kind = %self.format_kind,
            "Unit started: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            asset_id = %self.asset_id,
            kind = %self.format_kind,
            "Unit error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            asset_id = %self.asset_id,
            kind = %self.format_kind,
            "Unit completed: {}", message
        );
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn format_kind(&self) -> &str {
        &self.format_kind
    }

    /// Span covering the whole unit.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "unit",
            asset_id = %self.asset_id,
            kind = %self.format_kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_logger() {
        let logger = UnitLogger::new("vid-42", "bumper");
        assert_eq!(logger.asset_id(), "vid-42");
        assert_eq!(logger.format_kind(), "bumper");
        let _entered = logger.create_span().entered();
        logger.log_start("bumper 6s");
    }

    #[test]
    fn test_default_directives_parse() {
        for directive in DEFAULT_DIRECTIVES {
            assert!(directive.parse::<Directive>().is_ok());
        }
    }
}
