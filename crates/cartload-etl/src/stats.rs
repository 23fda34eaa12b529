//! Run-level statistics
//!
//! `RunStats` is owned exclusively by the orchestrator and mutated only at
//! chunk boundaries, after the chunk's load outcome is known. The
//! conservation invariant `total_rows == success_rows + rejected_rows` holds
//! after every observation.

use std::time::Instant;

use tracing::info;

/// Accumulator for one pipeline run
#[derive(Debug)]
pub struct RunStats {
    total_rows: u64,
    success_rows: u64,
    rejected_rows: u64,
    chunks: u64,
    progress_every: u64,
    started: Instant,
}

impl RunStats {
    /// Start the run clock. `progress_every` is the chunk cadence of
    /// progress notifications (0 disables them).
    pub fn new(progress_every: u64) -> Self {
        Self {
            total_rows: 0,
            success_rows: 0,
            rejected_rows: 0,
            chunks: 0,
            progress_every,
            started: Instant::now(),
        }
    }

    /// Record one fully-completed chunk: its row count and how many of
    /// those rows were loaded. The remainder is counted as rejected.
    pub fn observe_chunk(&mut self, chunk_index: u64, total_in_chunk: u64, loaded_in_chunk: u64) {
        debug_assert!(loaded_in_chunk <= total_in_chunk);

        self.chunks += 1;
        self.total_rows += total_in_chunk;
        self.success_rows += loaded_in_chunk;
        self.rejected_rows += total_in_chunk - loaded_in_chunk;

        if self.progress_every > 0 && (chunk_index + 1) % self.progress_every == 0 {
            info!(
                chunks = chunk_index + 1,
                total_rows = self.total_rows,
                success_rows = self.success_rows,
                "progress"
            );
        }
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn success_rows(&self) -> u64 {
        self.success_rows
    }

    pub fn rejected_rows(&self) -> u64 {
        self.rejected_rows
    }

    /// Freeze the accumulator into an immutable summary
    pub fn finalize(&self) -> RunSummary {
        let elapsed_seconds = self.started.elapsed().as_secs_f64();
        let rows_per_second = if elapsed_seconds > 0.0 {
            self.total_rows as f64 / elapsed_seconds
        } else {
            0.0
        };

        RunSummary {
            total_rows: self.total_rows,
            success_rows: self.success_rows,
            failed_rows: self.rejected_rows,
            elapsed_seconds,
            rows_per_second,
        }
    }
}

/// Immutable end-of-run summary
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_rows: u64,
    pub success_rows: u64,
    pub failed_rows: u64,
    pub elapsed_seconds: f64,
    pub rows_per_second: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "======== ETL run report ========")?;
        writeln!(f, "rows processed : {}", self.total_rows)?;
        writeln!(f, "rows loaded    : {}", self.success_rows)?;
        writeln!(f, "rows failed    : {}", self.failed_rows)?;
        writeln!(f, "elapsed        : {:.2}s", self.elapsed_seconds)?;
        writeln!(f, "throughput     : {:.1} rows/s", self.rows_per_second)?;
        write!(f, "================================")
    }
}
