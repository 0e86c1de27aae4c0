//! Error types for picking file formats.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing picking files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required file does not exist
    #[error("Expecting file {path:?}")]
    MissingFile {
        /// Path where the file was expected
        path: PathBuf,
    },

    /// A STAR data block is missing
    #[error("Missing data block '{block}' in {path:?}")]
    MissingBlock {
        /// Name of the block
        block: String,
        /// File that was searched
        path: PathBuf,
    },

    /// Required column is missing from a table
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// A line does not follow the expected layout
    #[error("Invalid line {line} in {path:?}: {message}")]
    InvalidLine {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A field value could not be converted to the requested type
    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue {
        /// Field name
        field: String,
        /// Raw value that failed to convert
        value: String,
    },
}

impl FormatError {
    /// Create a missing file error.
    pub fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid line error.
    pub fn invalid_line(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidLine {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}
