//! Storage error types
//!
//! This module provides error types for journal storage operations.

use thiserror::Error;

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Type alias for storage results
pub type StoreResult<T> = Result<T, StoreError>;
