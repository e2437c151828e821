//! Error taxonomy for quality gate evaluation
//!
//! Every failure is fatal to the evaluation that raised it: the caller gets
//! either a complete `QualityReport` or one of these errors, never both.

use thiserror::Error;

/// Failure reported by a `RegressionDataSource`
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Failed to read regression data from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed regression data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Regression data unavailable: {0}")]
    Unavailable(String),
}

/// Errors for quality gate evaluation
#[derive(Error, Debug)]
pub enum GateError {
    /// Threshold, window or identity configuration rejected before any remote call
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The regression data fetch failed
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    /// The event regex filter does not compile
    #[error("Invalid regex filter: {0}")]
    FilterCompile(#[from] regex::Error),
}

impl GateError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GateError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            GateError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
