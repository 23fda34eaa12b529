//! Cartload Common Library
//!
//! Shared error handling and logging for the cartload workspace.
//!
//! # Overview
//!
//! This crate provides the pieces used by every cartload component:
//!
//! - **Error Handling**: the run-fatal error type and result alias
//! - **Logging**: tracing subscriber configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use cartload_common::{Result, EtlError};
//!
//! fn open_source(path: &str) -> Result<()> {
//!     if !std::path::Path::new(path).exists() {
//!         return Err(EtlError::Source(format!("no such file: {path}")));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{EtlError, Result};
