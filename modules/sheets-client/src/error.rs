use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetsError>;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SheetsError {
    /// True when the token is rejected or lacks access to the spreadsheet.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, SheetsError::Api { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        SheetsError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SheetsError {
    fn from(err: serde_json::Error) -> Self {
        SheetsError::Parse(err.to_string())
    }
}
