//! Oracle calls with deadline, retry and fault classification.
//!
//! Every oracle call made by the pipeline goes through [`OracleGateway`].
//! The outcome is one of:
//! - `Ok(Some(answer))`: the oracle answered
//! - `Ok(None)`: degraded (timeout, malformed envelope, client error); callers fall back
//! - `Err(PipelineError::Oracle)`: hard fault (unreachable, refusing service)

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use reelcut_oracle::{AssetRef, HighlightSummary, Oracle, OracleError, OracleResult};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::retry::{retry_async_if, RetryConfig, RetryResult};

#[derive(Clone)]
pub struct OracleGateway {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
    retries: u32,
    base_delay: Duration,
}

impl OracleGateway {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration, retries: u32) -> Self {
        Self {
            oracle,
            timeout,
            retries,
            base_delay: RetryConfig::default().base_delay,
        }
    }

    pub fn from_config(oracle: Arc<dyn Oracle>, config: &PipelineConfig) -> Self {
        Self::new(oracle, config.oracle_timeout, config.oracle_retries)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Ask a free-text question.
    pub async fn generate(
        &self,
        asset: &AssetRef,
        prompt: &str,
        operation: &str,
    ) -> PipelineResult<Option<String>> {
        let retry = self.retry_config(operation);
        let result = retry_async_if(
            &retry,
            || self.with_deadline(self.oracle.generate_text(asset, prompt)),
            OracleError::is_retryable,
        )
        .await;
        classify(operation, result)
    }

    /// Fetch the oracle's generic highlight summary.
    pub async fn summarize(&self, asset: &AssetRef) -> PipelineResult<Option<Vec<HighlightSummary>>> {
        let retry = self.retry_config("summarize_highlights");
        let result = retry_async_if(
            &retry,
            || self.with_deadline(self.oracle.summarize_highlights(asset)),
            OracleError::is_retryable,
        )
        .await;
        classify("summarize_highlights", result)
    }

    fn retry_config(&self, operation: &str) -> RetryConfig {
        RetryConfig::new(operation)
            .with_max_retries(self.retries)
            .with_base_delay(self.base_delay)
    }

    async fn with_deadline<T>(
        &self,
        call: impl std::future::Future<Output = OracleResult<T>>,
    ) -> OracleResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout.as_secs())),
        }
    }
}

fn classify<T>(operation: &str, result: RetryResult<T, OracleError>) -> PipelineResult<Option<T>> {
    match result {
        RetryResult::Success(value) => Ok(Some(value)),
        RetryResult::Failed { error, attempts } if error.is_hard_fault() => {
            warn!(operation, attempts, error = %error, "Oracle unavailable");
            Err(error.into())
        }
        RetryResult::Failed { error, attempts } => {
            warn!(operation, attempts, error = %error, "Oracle call degraded");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::error::PipelineError;

    /// Oracle that replays scripted `generate_text` results.
    struct ScriptedOracle {
        script: Mutex<Vec<OracleResult<String>>>,
        calls: AtomicU32,
        delay: Duration,
    }

    impl ScriptedOracle {
        fn new(mut script: Vec<OracleResult<String>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn generate_text(&self, _asset: &AssetRef, _prompt: &str) -> OracleResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(OracleError::invalid_response("script exhausted")))
        }

        async fn summarize_highlights(&self, _asset: &AssetRef) -> OracleResult<Vec<HighlightSummary>> {
            Ok(vec![HighlightSummary::new("only", 1.0)])
        }
    }

    fn asset() -> AssetRef {
        AssetRef::new("vid", "/tmp/vid.mp4")
    }

    fn gateway(oracle: Arc<ScriptedOracle>) -> OracleGateway {
        OracleGateway::new(oracle, Duration::from_secs(5), 2).with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Err(OracleError::Http { status: 429, body: String::new() }),
            Ok("answer".to_string()),
        ]));
        let answer = gateway(oracle.clone()).generate(&asset(), "q", "test").await.unwrap();
        assert_eq!(answer.as_deref(), Some("answer"));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_degraded_error_yields_none() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Err(OracleError::invalid_response("bad"))]));
        let answer = gateway(oracle.clone()).generate(&asset(), "q", "test").await.unwrap();
        assert!(answer.is_none());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hard_fault_propagates() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Err(OracleError::Network("refused".into())),
            Err(OracleError::Network("refused".into())),
            Err(OracleError::Network("refused".into())),
        ]));
        let result = gateway(oracle.clone()).generate(&asset(), "q", "test").await;
        assert!(matches!(result, Err(PipelineError::Oracle(OracleError::Network(_)))));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_degraded() {
        let mut oracle = ScriptedOracle::new(vec![Ok("late".into())]);
        oracle.delay = Duration::from_millis(200);
        let gateway = OracleGateway::new(Arc::new(oracle), Duration::from_millis(20), 0);
        let answer = gateway.generate(&asset(), "q", "test").await.unwrap();
        assert!(answer.is_none());
    }

    #[tokio::test]
    async fn test_summarize() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let highlights = gateway(oracle).summarize(&asset()).await.unwrap().unwrap();
        assert_eq!(highlights.len(), 1);
    }
}
