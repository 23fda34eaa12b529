//! Pipeline orchestration
//!
//! Drives read -> transform -> load -> stats for each chunk in strict input
//! order, one chunk in memory at a time. Per-chunk load failures are
//! absorbed (records diverted to the error sink, counters updated) and the
//! run continues; only source, schema, and sink-acquisition failures abort.
//! The sink is closed on every exit path and a summary is always produced,
//! even for an aborted run.

use cartload_common::EtlError;
use thiserror::Error;
use tracing::{error, info};

use crate::config::EtlConfig;
use crate::error_sink::CsvErrorSink;
use crate::loader::{load_chunk, RecordSink};
use crate::reader::ChunkReader;
use crate::record::LoadOutcome;
use crate::schema::Schema;
use crate::stats::{RunStats, RunSummary};
use crate::transform::process_chunk;

/// A run-terminating failure, carrying whatever progress was made
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunAborted {
    pub error: EtlError,
    /// Partial statistics up to the abort point
    pub summary: RunSummary,
}

/// Chunked ETL orchestrator.
///
/// Owns the sink for the duration of the run; the loader borrows it per
/// call. Consumed by [`run`](Pipeline::run) — the chunk stream is
/// forward-only and a run is not restartable.
pub struct Pipeline<S: RecordSink> {
    config: EtlConfig,
    sink: S,
    error_sink: CsvErrorSink,
}

impl<S: RecordSink> Pipeline<S> {
    /// Validate the configuration and assemble the pipeline
    pub fn new(config: EtlConfig, sink: S) -> cartload_common::Result<Self> {
        config.validate()?;
        let error_sink = CsvErrorSink::new(&config.error_file);
        Ok(Self {
            config,
            sink,
            error_sink,
        })
    }

    /// Run the pipeline to completion or abort.
    ///
    /// Every input row is accounted for in exactly one summary bucket:
    /// loaded, rejected by validation, or diverted by a failed load.
    pub async fn run(mut self) -> Result<RunSummary, RunAborted> {
        info!(
            input = %self.config.input_path.display(),
            table = %self.config.target_table,
            chunk_size = self.config.chunk_size,
            "pipeline started"
        );

        let mut stats = RunStats::new(self.config.progress_every);

        let mut reader = match ChunkReader::open(
            &self.config.input_path,
            Schema::orders(),
            self.config.chunk_size,
        ) {
            Ok(reader) => reader,
            Err(e) => return Err(self.abort(e, &stats).await),
        };

        let mut chunk_index: u64 = 0;
        loop {
            let rows = match reader.next_chunk() {
                Ok(Some(rows)) => rows,
                Ok(None) => break,
                Err(e) => return Err(self.abort(e, &stats).await),
            };

            let processed = process_chunk(
                &rows,
                reader.schema(),
                self.config.amount_bounds,
                &self.config.category_thresholds,
            );
            let total = processed.total() as u64;

            let loaded = match load_chunk(
                &self.sink,
                &self.config.target_table,
                processed.admissible,
            )
            .await
            {
                LoadOutcome::Loaded(count) => count as u64,
                LoadOutcome::Failed { records, .. } => {
                    // Chunk bulkhead: divert and keep going
                    self.error_sink.record(&records, "load_failed");
                    0
                },
            };

            stats.observe_chunk(chunk_index, total, loaded);
            chunk_index += 1;
        }

        self.sink.close().await;
        let summary = stats.finalize();
        info!(
            total_rows = summary.total_rows,
            success_rows = summary.success_rows,
            failed_rows = summary.failed_rows,
            "pipeline completed"
        );
        Ok(summary)
    }

    /// Release resources and surface a fatal failure with partial stats
    async fn abort(self, err: EtlError, stats: &RunStats) -> RunAborted {
        self.sink.close().await;
        let summary = stats.finalize();
        error!(
            error = %err,
            total_rows = summary.total_rows,
            "pipeline aborted"
        );
        RunAborted { error: err, summary }
    }
}
