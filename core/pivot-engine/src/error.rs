//! FILENAME: core/pivot-engine/src/error.rs

use thiserror::Error;

/// Data-consistency errors. They signal that headers, descriptors or column
/// ids handed to the pipeline do not match each other; callers treat them as
/// contract violations, not as user-facing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    #[error("could not find header matching {0}")]
    HeaderNotFound(String),

    #[error("unknown header kind: {0}")]
    UnknownHeaderKind(String),

    #[error("expected {expected} dimensions, got {actual}")]
    DimensionCountMismatch { expected: usize, actual: usize },

    #[error("invalid object uri: {0}")]
    InvalidUri(String),

    #[error("invalid column field: {0}")]
    InvalidField(String),

    #[error("measure group has no measures")]
    EmptyMeasureGroup,
}

pub type PivotResult<T> = Result<T, PivotError>;
