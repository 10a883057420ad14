//! Journal error types
//!
//! This module provides error types for entry validation, ledger operations
//! and the CSV codec.

use thiserror::Error;
use validator::ValidationErrors;

/// Errors raised by the journal model and its controllers
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Whole-file failures of the CSV codec.
///
/// Row-level defects never surface here; they are reported as
/// [`crate::csv_codec::ParseWarning`]s alongside a best-effort result.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Input contains no CSV lines")]
    Empty,

    #[error("Input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Header row could not be read: {0}")]
    MissingHeader(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for journal results
pub type JournalResult<T> = Result<T, JournalError>;

/// Type alias for codec results
pub type CodecResult<T> = Result<T, CodecError>;
