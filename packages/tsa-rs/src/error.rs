use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Access forbidden: {0}")]
    AccessForbidden(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    #[error("Unknown analysis: {0}")]
    UnknownOperation(String),

    #[error("Missing required input: {0}")]
    MissingParameter(String),

    #[error("Failed to parse series data: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
