//! Error types for Ventana operations

use thiserror::Error;

/// Result type for Ventana operations
pub type Result<T> = std::result::Result<T, VentanaError>;

/// Errors that can occur during Ventana operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VentanaError {
    /// Operand dimensions are incompatible (non-square kernel, matmul inner dims)
    #[error("Dimension mismatch: {left}, {right}")]
    DimensionMismatch {
        /// Left-hand dimension
        left: usize,
        /// Right-hand dimension
        right: usize,
    },

    /// Element count does not match the requested shape
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Window bounds, stride, kernel size or padding width out of range
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// The bounded worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
