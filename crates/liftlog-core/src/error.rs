//! Core error types for liftlog-core.
//!
//! Not-found outcomes on update/delete are reported as boolean results, not
//! errors; the error types here cover store I/O and validation rejects.

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for liftlog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors, rejected before any write
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read a collection key from the backend
    #[error("Failed to read key '{key}': {source}")]
    ReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a collection key to the backend
    #[error("Failed to write key '{key}': {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode a collection as JSON
    #[error("Failed to encode collection '{key}': {source}")]
    EncodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Data directory cannot be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Routine name is empty or whitespace
    #[error("Routine name must not be empty")]
    EmptyRoutineName,

    /// Exercise name is empty or whitespace
    #[error("Exercise name must not be empty")]
    EmptyExerciseName,

    /// No routine selected when scheduling
    #[error("No routine selected")]
    NoRoutineSelected,

    /// Referenced routine does not exist in the store
    #[error("Unknown routine: {0}")]
    UnknownRoutine(String),

    /// A workout is already scheduled for the given day
    #[error("A workout is already scheduled for {0}")]
    DayAlreadyScheduled(NaiveDate),

    /// Invalid field value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
