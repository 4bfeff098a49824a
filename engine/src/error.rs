//! FILENAME: engine/src/error.rs

use thiserror::Error;

/// Failures raised by the engine. Per-cell problems (a bad formula, an
/// unparsable date) are normally absorbed into `null` values by the caller;
/// these errors only reach the request boundary when a whole operation
/// cannot run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unsafe expression: {0}")]
    UnsafeExpression(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unhandled failure: {0}")]
    UnhandledFailure(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
