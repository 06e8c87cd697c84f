use ai_client::AiError;
use thiserror::Error;

use crate::parser::Section;

/// Failures of the row store. Both are fatal when they happen while loading.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Schema mismatch: missing column(s) {} (found: {})", .missing.join(", "), .found.join(", "))]
    SchemaMismatch {
        missing: Vec<String>,
        found: Vec<String>,
    },
}

/// Failures of the remote generation call, after retry handling.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Transient service error after {attempts} attempt(s): {source}")]
    TransientServiceError {
        attempts: u32,
        #[source]
        source: AiError,
    },

    #[error("Fatal service error: {source}")]
    FatalServiceError {
        #[source]
        source: AiError,
    },
}

/// The generator's reply could not be mapped onto the four sections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unparseable response: missing {0} section")]
    MissingSection(Section),

    #[error("Unparseable response: {0} section appears more than once")]
    DuplicateSection(Section),

    #[error("Unparseable response: {found} section found where {expected} was expected")]
    OutOfOrder { expected: Section, found: Section },

    #[error("Unparseable response: {0} section is empty")]
    EmptySection(Section),

    #[error("Unparseable response: invalid JSON ({0})")]
    InvalidJson(String),
}

/// Why a single row failed. Never aborts the run.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    UnparseableResponse(#[from] ParseError),

    #[error("Write failed: {0}")]
    Write(#[from] StoreError),
}

impl RowError {
    /// Stable short name for logs and the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::InvalidInput(_) => "invalid_input",
            RowError::Generation(GenerationError::TransientServiceError { .. }) => {
                "transient_service_error"
            }
            RowError::Generation(GenerationError::FatalServiceError { .. }) => {
                "fatal_service_error"
            }
            RowError::UnparseableResponse(_) => "unparseable_response",
            RowError::Write(_) => "write_failed",
        }
    }
}

/// Errors that end a run before any row is processed.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}
