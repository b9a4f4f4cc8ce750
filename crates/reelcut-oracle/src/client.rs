//! HTTP client for the Twelve Labs video-understanding API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{OracleError, OracleResult};
use crate::types::{AssetRef, HighlightSummary};
use crate::Oracle;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.twelvelabs.io/v1.2";

/// Oracle client configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Base URL (no trailing slash)
    pub base_url: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> OracleResult<Self> {
        let api_key = std::env::var("TWELVE_LABS_API_KEY")
            .map_err(|_| OracleError::config("TWELVE_LABS_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ORACLE_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        config.timeout = Duration::from_secs(
            std::env::var("ORACLE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        );
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    video_id: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    video_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    #[serde(default)]
    highlights: Vec<HighlightSummary>,
}

/// Twelve Labs API client.
pub struct TwelveLabsClient {
    config: OracleConfig,
    client: Client,
}

impl TwelveLabsClient {
    pub fn new(config: OracleConfig) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> OracleResult<Self> {
        Self::new(OracleConfig::from_env()?)
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> OracleResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Oracle {} returned {}", endpoint, status);
            return Err(OracleError::Http { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::invalid_response(format!("{} response: {}", endpoint, e)))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.config.timeout.as_secs())
        } else {
            OracleError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Oracle for TwelveLabsClient {
    async fn generate_text(&self, asset: &AssetRef, prompt: &str) -> OracleResult<String> {
        let request = GenerateRequest {
            video_id: &asset.video_id,
            prompt,
        };
        let response: GenerateResponse = self.post("generate", &request).await?;
        response
            .data
            .ok_or_else(|| OracleError::invalid_response("generate response has no data"))
    }

    async fn summarize_highlights(&self, asset: &AssetRef) -> OracleResult<Vec<HighlightSummary>> {
        let request = SummarizeRequest {
            video_id: &asset.video_id,
            kind: "highlight",
        };
        let response: SummarizeResponse = self.post("summarize", &request).await?;
        Ok(response.highlights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TwelveLabsClient {
        let config = OracleConfig::new("test-key")
            .with_base_url(format!("{}/", server.uri()))
            .with_timeout(Duration::from_secs(5));
        TwelveLabsClient::new(config).unwrap()
    }

    fn asset() -> AssetRef {
        AssetRef::new("vid-1", "/tmp/source.mp4")
    }

    #[test]
    fn test_config_defaults() {
        let config = OracleConfig::new("k");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.with_base_url("http://x/").base_url, "http://x");
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({"video_id": "vid-1", "prompt": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "gen-1",
                "data": "{\"key_moments\": []}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).generate_text(&asset(), "hello").await.unwrap();
        assert_eq!(text, "{\"key_moments\": []}");
    }

    #[tokio::test]
    async fn test_generate_text_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "gen-1"})))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_text(&asset(), "p").await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse(_)));
        assert!(!err.is_hard_fault());
    }

    #[tokio::test]
    async fn test_server_error_is_hard_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_text(&asset(), "p").await.unwrap_err();
        match &err {
            OracleError::Http { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_hard_fault());
    }

    #[tokio::test]
    async fn test_summarize_highlights() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .and(body_partial_json(json!({"video_id": "vid-1", "type": "highlight"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "highlights": [
                    {"highlight": "Opening hook", "start": 3.0, "end": 9.5},
                    {"highlight": "Demo", "start": 40}
                ]
            })))
            .mount(&server)
            .await;

        let highlights = client_for(&server).summarize_highlights(&asset()).await.unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0].text, "Opening hook");
        assert_eq!(highlights[1].start, 40.0);
        assert_eq!(highlights[1].end, None);
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        let config = OracleConfig::new("k")
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let client = TwelveLabsClient::new(config).unwrap();
        let err = client.generate_text(&asset(), "p").await.unwrap_err();
        assert!(err.is_hard_fault(), "got {:?}", err);
    }
}
