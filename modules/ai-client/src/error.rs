use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

impl AiError {
    /// Whether the same request may succeed if sent again later.
    ///
    /// Rate limits (429), request timeouts (408) and server-side failures
    /// (5xx) are transient. Every other 4xx means the request or credential
    /// is wrong and repeating it will not help.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Network(_) | AiError::Timeout(_) | AiError::EmptyResponse => true,
            AiError::Api { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            AiError::Config(_) | AiError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return AiError::Parse(e.to_string());
        }
        AiError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}
