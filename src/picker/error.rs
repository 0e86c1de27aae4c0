//! Error types for picker model operations.

use thiserror::Error;

use crate::format::FormatError;
use crate::model::MicrographId;

/// Errors surfaced by picker models to the view layer.
#[derive(Error, Debug)]
pub enum PickerError {
    /// File reading or parsing failed
    #[error(transparent)]
    Format(#[from] FormatError),

    /// No micrograph with this id in the model
    #[error("Micrograph not found: {0}")]
    MicrographNotFound(MicrographId),

    /// Row index outside the summary table
    #[error("Invalid row {row} (model has {rows} rows)")]
    InvalidRow {
        /// Requested row
        row: usize,
        /// Number of rows in the model
        rows: usize,
    },

    /// Coordinate index outside a micrograph's list
    #[error("Invalid coordinate {index} on micrograph {micrograph} ({len} coordinates)")]
    InvalidCoordinate {
        micrograph: MicrographId,
        index: usize,
        len: usize,
    },

    /// Column index not defined by the model
    #[error("Invalid column value '{0}'")]
    InvalidColumn(usize),

    /// A parameter value has the wrong type or is missing
    #[error("Invalid value for parameter '{name}': {message}")]
    InvalidParamValue {
        /// Parameter name
        name: String,
        /// Description of the problem
        message: String,
    },

    /// The micrograph image could not be located for a run entry
    #[error("Can not find root path for mic: {0}")]
    MicrographPathNotFound(String),

    /// The model does not support this operation in its current state
    #[error("Unsupported operation '{operation}': {reason}")]
    Unsupported {
        /// Operation that was attempted
        operation: String,
        /// Why it is not supported
        reason: String,
    },
}

impl PickerError {
    /// Create an invalid parameter value error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParamValue {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
