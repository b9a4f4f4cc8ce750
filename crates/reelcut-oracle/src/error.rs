//! Oracle error types.

use thiserror::Error;

pub type OracleResult<T> = Result<T, OracleError>;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Oracle request failed: {0}")]
    Network(String),

    #[error("Oracle returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Oracle request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid oracle response: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// The oracle is unreachable or refusing service.
    ///
    /// Hard faults abort the current unit of work. Everything else is
    /// treated as a degraded answer and routed to the fallback path.
    pub fn is_hard_fault(&self) -> bool {
        match self {
            OracleError::Config(_) | OracleError::Network(_) => true,
            OracleError::Http { status, .. } => *status >= 500 || matches!(status, 401 | 403 | 429),
            OracleError::Timeout(_) | OracleError::InvalidResponse(_) => false,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Network(_) | OracleError::Timeout(_) => true,
            OracleError::Http { status, .. } => *status >= 500 || *status == 429,
            OracleError::Config(_) | OracleError::InvalidResponse(_) => false,
        }
    }
}
