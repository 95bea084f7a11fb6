//! Error types for the Ferret library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`FerretError`] enum. Query construction problems surface as
//! `InvalidArgument`, protocol misuse as `InvalidState`, and reader
//! failures as `Io`. A missing field or term is never an error: the
//! affected scorer simply matches nothing.

use std::io;

use thiserror::Error;

/// The main error type for Ferret operations.
#[derive(Error, Debug)]
pub enum FerretError {
    /// I/O errors propagated from the index reader.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors.
    #[error("Index error: {0}")]
    Index(String),

    /// Query construction or evaluation errors.
    #[error("Query error: {0}")]
    Query(String),

    /// Numeric or query-string parse errors.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An argument violated an invariant.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was invoked in the wrong state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error.
    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`FerretError`].
pub type Result<T> = std::result::Result<T, FerretError>;

impl FerretError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        FerretError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        FerretError::Query(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        FerretError::Parse(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        FerretError::InvalidArgument(msg.into())
    }

    /// Create a new invalid state error.
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        FerretError::InvalidState(msg.into())
    }
}
