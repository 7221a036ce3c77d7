//! FILENAME: app/grid-bridge/src/error.rs

use pivot_engine::PivotError;
use thiserror::Error;

/// Failures of the query engine behind a [`crate::PreparedExecution`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("execution failed: {0}")]
    Execution(String),

    #[error("window at offset {offset} with size {size} could not be read: {reason}")]
    Window {
        offset: usize,
        size: usize,
        reason: String,
    },

    #[error("execution was cancelled")]
    Cancelled,
}

/// Errors of the session-level APIs.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("pivot error: {0}")]
    Pivot(#[from] PivotError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
