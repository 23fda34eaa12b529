//! Error types for cartload
//!
//! Only run-fatal conditions are modelled here. Per-field coercion failures
//! and per-chunk load failures are ordinary data (`Option` fields,
//! `RejectReason`, `LoadOutcome` in the pipeline crate) and never pass
//! through this type.

use thiserror::Error;

/// Result type alias for cartload operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Run-fatal error type for cartload
///
/// All variants abort the run; messages are user-facing and actionable.
#[derive(Error, Debug)]
pub enum EtlError {
    /// The input source cannot be opened or is structurally malformed
    #[error("Source error: {0}. Verify the input path exists, is readable, and is well-formed delimited text.")]
    Source(String),

    /// The source header does not satisfy the target schema
    #[error("Schema mismatch: {0}. The input header row must contain every schema column (order may differ).")]
    Schema(String),

    /// The relational sink cannot be acquired
    #[error("Sink error: {0}. Check the database URL, credentials, and that the server is reachable.")]
    Sink(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    /// Convenience constructor for source errors
    pub fn source(msg: impl Into<String>) -> Self {
        EtlError::Source(msg.into())
    }

    /// Convenience constructor for schema errors
    pub fn schema(msg: impl Into<String>) -> Self {
        EtlError::Schema(msg.into())
    }

    /// Convenience constructor for sink errors
    pub fn sink(msg: impl Into<String>) -> Self {
        EtlError::Sink(msg.into())
    }

    /// Convenience constructor for configuration errors
    pub fn config(msg: impl Into<String>) -> Self {
        EtlError::Config(msg.into())
    }
}
