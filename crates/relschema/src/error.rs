//! Client error types.

use relschema_core::{Operation, ValidationFailure};
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Declaration, hydration or lookup error.
    #[error(transparent)]
    Core(#[from] relschema_core::Error),

    /// The payload of an operation was rejected.
    #[error("invalid {operation} arguments for model '{model}': {failure}")]
    Validation {
        /// Model name.
        model: String,
        /// Operation.
        operation: Operation,
        /// Every issue found.
        failure: ValidationFailure,
    },
}

impl Error {
    /// The validation failure, if this is one.
    pub fn validation_failure(&self) -> Option<&ValidationFailure> {
        match self {
            Error::Validation { failure, .. } => Some(failure),
            Error::Core(_) => None,
        }
    }
}
