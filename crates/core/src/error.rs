//! Error types for the Promptify runner.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, HTTP transport, template data,
//! pre-flight validation and remote execution outcomes.

use thiserror::Error;

/// Message reported for every remote execution failure.
///
/// The upstream detail is logged, never surfaced through this error.
pub const GENERIC_FAILURE: &str = "Something wrong happened";

/// Unified error type for the Promptify runner.
///
/// All functions in the workspace return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors (connect failures, non-success JSON responses)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Template data errors
    #[error("Template error: {0}")]
    Template(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Required fields absent from the supplied values (display names)
    #[error("Enter or map all required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The execution stream was refused with a client-error status
    #[error("{reason}")]
    Rejected { status: u16, reason: String },

    /// The remote execution failed; details are only in the logs
    #[error("{}", GENERIC_FAILURE)]
    ExecutionFailed,

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
