use thiserror::Error;

/// Main error type for esquery operations
#[derive(Error, Debug)]
pub enum EsQueryError {
    #[error("Decode error at '{key}': {reason}")]
    Decode { key: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search engine returned status {status}: {body}")]
    Search { status: u16, body: String },

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for esquery operations
pub type Result<T> = std::result::Result<T, EsQueryError>;

impl EsQueryError {
    pub(crate) fn decode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        EsQueryError::Decode {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error comes from a malformed query rather than from the engine
    pub fn is_decode(&self) -> bool {
        matches!(self, EsQueryError::Decode { .. })
    }

    /// Check if this error indicates a transient failure that could be retried
    pub fn is_retriable(&self) -> bool {
        match self {
            EsQueryError::Transport(e) => e.is_connect() || e.is_timeout(),
            EsQueryError::Search { status, .. } => *status == 429 || *status >= 502,
            _ => false,
        }
    }
}
