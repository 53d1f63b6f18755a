//! Error types for dotproduct operations.
//!
//! Every precondition of a multiplication is checked before the parallel
//! reduction starts, so callers get one of these variants instead of a
//! corrupted or partial product.

use std::fmt;

use thiserror::Error;

/// Which side of the product a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Left,
    Right,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Left => write!(f, "left"),
            Operand::Right => write!(f, "right"),
        }
    }
}

/// Errors that can occur while multiplying two matrices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DotProductError {
    /// Columns of the left operand differ from rows of the right operand.
    #[error("dimension mismatch: left has {left_columns} columns but right has {right_rows} rows")]
    DimensionMismatch {
        /// Column count of the left operand.
        left_columns: usize,
        /// Row count of the right operand.
        right_rows: usize,
    },
    /// A row of a nested matrix has a different length than the first row.
    #[error("ragged {operand} matrix: row {row} has {found} cells, expected {expected}")]
    RaggedMatrix {
        /// The operand holding the short or long row.
        operand: Operand,
        /// Index of the first row whose length differs.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// An operand does not fit the configured scratch capacity.
    #[error("{operand} matrix needs {requested} elements but scratch capacity is {capacity}")]
    CapacityExceeded {
        /// The operand that did not fit.
        operand: Operand,
        /// Elements the operand needs.
        requested: usize,
        /// Elements the arena is allowed to hold per operand.
        capacity: usize,
    },
    /// The engine configuration was rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        message: String,
    },
    /// The worker pool could not be started.
    #[error("failed to build worker pool: {message}")]
    ThreadPool {
        /// The error reported by the pool builder.
        message: String,
    },
    /// The reduction was cancelled before every row was computed.
    #[error("multiplication cancelled after {completed_rows} of {total_rows} rows")]
    Cancelled {
        /// Output rows finished before the cancellation was seen.
        completed_rows: usize,
        /// Output rows the product would have had.
        total_rows: usize,
    },
    /// A product cell does not fit the requested integral type.
    #[error("value at ({row}, {column}) is not representable in the target type")]
    NumericOverflow {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        column: usize,
    },
}

/// Result type alias for dotproduct operations.
pub type Result<T> = std::result::Result<T, DotProductError>;

/// Creates a dimension mismatch error.
pub fn dimension_mismatch(left_columns: usize, right_rows: usize) -> DotProductError {
    DotProductError::DimensionMismatch {
        left_columns,
        right_rows,
    }
}

/// Creates a ragged matrix error.
pub fn ragged_matrix(operand: Operand, row: usize, expected: usize, found: usize) -> DotProductError {
    DotProductError::RaggedMatrix {
        operand,
        row,
        expected,
        found,
    }
}

/// Creates a capacity error.
pub fn capacity_exceeded(operand: Operand, requested: usize, capacity: usize) -> DotProductError {
    DotProductError::CapacityExceeded {
        operand,
        requested,
        capacity,
    }
}

/// Creates a configuration error.
pub fn invalid_config(message: impl Into<String>) -> DotProductError {
    DotProductError::InvalidConfig {
        message: message.into(),
    }
}
