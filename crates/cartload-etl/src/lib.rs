//! Cartload ETL Library
//!
//! Chunked Extract-Transform-Load pipeline for large delimited commerce-order
//! files. Reads the source in bounded chunks, coerces and validates each
//! record, derives a price category, bulk-inserts admissible records into a
//! relational sink, and diverts failed chunks to an append-only error file.
//!
//! # Pipeline
//!
//! ```text
//! ChunkReader -> coerce -> validate -> categorize -> BatchLoader -> sink
//!                                                        |
//!                                                        +--> CsvErrorSink
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cartload_etl::{config::EtlConfig, loader::PgSink, pipeline::Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EtlConfig::new("./data/orders.csv", "orders");
//!     let sink = PgSink::connect("postgres://localhost/commerce").await?;
//!     let summary = Pipeline::new(config, sink)?.run().await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error_sink;
pub mod loader;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod schema;
pub mod stats;
pub mod transform;

// Re-export the main entry points
pub use config::EtlConfig;
pub use loader::{PgSink, RecordSink};
pub use pipeline::{Pipeline, RunAborted};
pub use record::{LoadOutcome, PriceCategory, ProcessedChunk, RejectReason, TypedRecord};
pub use stats::RunSummary;
