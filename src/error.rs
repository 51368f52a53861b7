//! Error types for resample_bench

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Main error type
#[derive(Error, Debug)]
pub enum EvalError {
    /// A requested column does not exist (or is duplicated) in the schema at hand
    #[error("Schema error: {0}")]
    Schema(String),

    /// A model could not be fit to the given data
    #[error("Fit error: {0}")]
    Fit(String),

    /// A fitted model could not score the given rows
    #[error("Prediction error: {0}")]
    Predict(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

/// Coarse classification used when a failure is reported as a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    Schema,
    Fit,
    Predict,
    Other,
}

impl EvalError {
    /// Shorthand for a missing-column schema error
    pub fn missing_column(name: &str) -> Self {
        EvalError::Schema(format!("column '{}' not found", name))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Schema(_) => ErrorKind::Schema,
            EvalError::Fit(_) | EvalError::InvalidParameter { .. } => ErrorKind::Fit,
            EvalError::Predict(_) => ErrorKind::Predict,
            _ => ErrorKind::Other,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Schema => "schema",
            ErrorKind::Fit => "fit",
            ErrorKind::Predict => "predict",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl From<polars::error::PolarsError> for EvalError {
    fn from(err: polars::error::PolarsError) -> Self {
        EvalError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for EvalError {
    fn from(err: ndarray::ShapeError) -> Self {
        EvalError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
