// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, UncertaintyError>;

/// Errors raised while constructing or propagating uncertain quantities.
///
/// All failures are local to the call that raised them: propagation is a
/// pure computation, so nothing is retried and no partial result is kept.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum UncertaintyError {
    /// The function has no propagation rule and cannot be differentiated.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// A standard deviation was negative.
    #[error("standard deviation must be non-negative, got {error}")]
    NegativeStdDev { error: f64 },

    /// The operation would strip the uncertainty and strict downcasting is on.
    #[error("{operation} would discard the uncertainty")]
    Downcast { operation: String },

    /// Operand shapes cannot be reconciled.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        expected: usize,
        found: usize,
        context: &'static str,
    },

    #[error("failed to parse: {0}")]
    Parse(String),
}

impl UncertaintyError {
    pub(crate) fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    pub(crate) fn shape(context: &'static str, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch {
            expected,
            found,
            context,
        }
    }
}
