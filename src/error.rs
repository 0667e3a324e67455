use crate::model::{Combination, FieldErrors};
use thiserror::Error;

/// Which half of a commit a batch belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Create,
    Delete,
}

impl std::fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchOperation::Create => write!(f, "create"),
            BatchOperation::Delete => write!(f, "delete"),
        }
    }
}

/// One failed request inside a commit, together with the combinations it carried
#[derive(Debug)]
pub struct BatchError {
    pub operation: BatchOperation,
    /// Zero-based index of the batch within its operation
    pub batch: usize,
    pub combinations: Vec<Combination>,
    pub error: VariationError,
}

#[derive(Debug, Error)]
pub enum VariationError {
    /// The request never completed
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Structured rejection from the backend
    #[error("backend rejected request ({status}): {message}")]
    Validation {
        status: u16,
        code: Option<String>,
        message: String,
        /// Per-record field errors, aligned with the records of the request
        fields: Vec<FieldErrors>,
    },

    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid decimal value '{0}'")]
    InvalidNumber(String),

    #[error("maximum of {max} variables reached")]
    MaxVariables { max: usize },

    #[error("maximum of {max} values reached for variable '{variable}'")]
    MaxValues { variable: String, max: usize },

    #[error("every variable needs at least one value")]
    IncompleteVariables,

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("no pending record for combination '{0}'")]
    UnknownCombination(String),

    #[error("variable name must not be empty")]
    EmptyVariableName,

    #[error("value '{value}' given more than once for variable '{variable}'")]
    DuplicateValue { variable: String, value: String },

    #[error("no pending combination changes")]
    NothingToCommit,

    #[error("{message}")]
    BatchFailure {
        message: String,
        errors: Vec<BatchError>,
    },
}

impl VariationError {
    /// True for errors raised before any request was made
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            VariationError::MaxVariables { .. }
                | VariationError::MaxValues { .. }
                | VariationError::IncompleteVariables
                | VariationError::UnknownVariable(_)
                | VariationError::EmptyVariableName
                | VariationError::UnknownCombination(_)
                | VariationError::DuplicateValue { .. }
                | VariationError::NothingToCommit
                | VariationError::InvalidNumber(_)
        )
    }

    /// Per-record field errors carried by a validation failure
    pub fn field_errors(&self) -> &[FieldErrors] {
        match self {
            VariationError::Validation { fields, .. } => fields,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, VariationError>;
