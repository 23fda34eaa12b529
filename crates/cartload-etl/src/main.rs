//! cartload - chunked commerce-order ETL

use anyhow::Result;
use cartload_common::logging::{init_logging, LogConfig, LogLevel};
use cartload_etl::{EtlConfig, PgSink, Pipeline};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cartload")]
#[command(author, version, about = "Chunked CSV-to-Postgres order loader")]
struct Cli {
    /// Delimited input file with order records
    input: PathBuf,

    /// Postgres connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Target table for admissible records
    #[arg(long, default_value = "orders")]
    table: String,

    /// Rows per chunk
    #[arg(long, default_value_t = cartload_etl::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Fallback file for records that fail to load
    #[arg(long, default_value = cartload_etl::config::DEFAULT_ERROR_FILE)]
    error_file: PathBuf,

    /// Emit a progress line every N chunks (0 disables)
    #[arg(long, default_value_t = 10)]
    progress_every: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the CLI-built values
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("cartload".to_string())
        .build()
        .overlay_env()?;

    init_logging(&log_config)?;

    let mut config = EtlConfig::new(cli.input, cli.table);
    config.database_url = cli.database_url;
    config.chunk_size = cli.chunk_size;
    config.error_file = cli.error_file;
    config.progress_every = cli.progress_every;
    let config = config.from_env()?;

    let sink = PgSink::connect(&config.database_url).await?;
    let pipeline = Pipeline::new(config, sink)?;

    match pipeline.run().await {
        Ok(summary) => {
            info!("\n{summary}");
            Ok(())
        },
        Err(aborted) => {
            // The partial summary still accounts for every row seen
            info!("\n{}", aborted.summary);
            Err(aborted.error.into())
        },
    }
}
