//! Pipeline configuration
//!
//! Defaults mirror the production job: 10k-row chunks, amount admissible in
//! the exclusive range (0, 100000), price buckets at 50/100/500. Environment
//! variables overlay the programmatic values.

use std::path::PathBuf;

use cartload_common::{EtlError, Result};
use serde::{Deserialize, Serialize};

/// Default rows per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default exclusive admissible amount range
pub const DEFAULT_AMOUNT_BOUNDS: (f64, f64) = (0.0, 100_000.0);

/// Default price-category breakpoints (micro/small/medium upper bounds)
pub const DEFAULT_CATEGORY_THRESHOLDS: [f64; 3] = [50.0, 100.0, 500.0];

/// Default fallback file for unloadable records
pub const DEFAULT_ERROR_FILE: &str = "error_records.csv";

/// Configuration for one ETL run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Path of the delimited input file
    pub input_path: PathBuf,

    /// Rows per chunk (bounds the pipeline's memory footprint)
    pub chunk_size: usize,

    /// Sink connection descriptor (Postgres URL)
    pub database_url: String,

    /// Target table for admissible records
    pub target_table: String,

    /// Append-only fallback file for unloadable records
    pub error_file: PathBuf,

    /// Exclusive (lower, upper) admissible amount range
    pub amount_bounds: (f64, f64),

    /// Ascending price-category breakpoints
    pub category_thresholds: [f64; 3],

    /// Emit a progress notification every N chunks (0 disables)
    pub progress_every: u64,
}

impl EtlConfig {
    /// Build a config with defaults for everything but input and table
    pub fn new(input_path: impl Into<PathBuf>, target_table: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            database_url: String::new(),
            target_table: target_table.into(),
            error_file: PathBuf::from(DEFAULT_ERROR_FILE),
            amount_bounds: DEFAULT_AMOUNT_BOUNDS,
            category_thresholds: DEFAULT_CATEGORY_THRESHOLDS,
            progress_every: 10,
        }
    }

    /// Overlay values from environment variables
    ///
    /// - `CARTLOAD_DATABASE_URL`: sink connection URL
    /// - `CARTLOAD_TABLE`: target table
    /// - `CARTLOAD_CHUNK_SIZE`: rows per chunk
    /// - `CARTLOAD_ERROR_FILE`: fallback file path
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("CARTLOAD_DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(table) = std::env::var("CARTLOAD_TABLE") {
            self.target_table = table;
        }
        if let Ok(size) = std::env::var("CARTLOAD_CHUNK_SIZE") {
            self.chunk_size = size
                .parse()
                .map_err(|_| EtlError::config(format!("invalid CARTLOAD_CHUNK_SIZE: {size}")))?;
        }
        if let Ok(path) = std::env::var("CARTLOAD_ERROR_FILE") {
            self.error_file = PathBuf::from(path);
        }
        Ok(self)
    }

    /// Check the configuration once at startup
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(EtlError::config("chunk_size must be positive"));
        }
        if !is_valid_table_name(&self.target_table) {
            return Err(EtlError::config(format!(
                "invalid target_table '{}': expected a plain or schema-qualified \
                 SQL identifier",
                self.target_table
            )));
        }
        let (lower, upper) = self.amount_bounds;
        if lower >= upper {
            return Err(EtlError::config(format!(
                "amount_bounds lower ({lower}) must be below upper ({upper})"
            )));
        }
        if !self.category_thresholds.windows(2).all(|w| w[0] < w[1]) {
            return Err(EtlError::config(
                "category_thresholds must be strictly ascending",
            ));
        }
        Ok(())
    }
}

/// Accept `table` or `schema.table`, each part a plain SQL identifier.
///
/// The table name is interpolated into INSERT statements (identifiers
/// cannot be bound), so a typo'd or malformed name is caught here at
/// startup instead of as a confusing SQL error mid-run.
fn is_valid_table_name(name: &str) -> bool {
    let mut parts = name.split('.');
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    match (parts.next(), parts.next(), parts.next()) {
        (Some(table), None, _) => valid_part(table),
        (Some(schema), Some(table), None) => valid_part(schema) && valid_part(table),
        _ => false,
    }
}
