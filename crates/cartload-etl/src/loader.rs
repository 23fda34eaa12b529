//! Batch persistence into the relational sink
//!
//! One bulk operation per chunk. The sink is a trait seam so the pipeline
//! and its tests run against doubles; the production implementation is a
//! sqlx Postgres pool doing multi-row VALUES inserts in sub-batches.
//!
//! Any sink failure fails the whole chunk: the admissible set comes back in
//! the `LoadOutcome` for fallback recording and the run continues with the
//! next chunk (chunk-level bulkhead).

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, warn};

use cartload_common::{EtlError, Result};

use crate::record::{LoadOutcome, TypedRecord};

/// Rows per INSERT statement inside one chunk load
const INSERT_BATCH_ROWS: usize = 500;

/// Append-only record sink for admissible order records
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist a batch of records into `table`, returning rows written.
    ///
    /// Partial success across sub-batches is acceptable; the caller still
    /// treats any error as a whole-chunk failure.
    async fn insert_batch(&self, table: &str, records: &[TypedRecord]) -> anyhow::Result<u64>;

    /// Release sink resources. Called exactly once on every run exit path.
    async fn close(&self) {}
}

#[async_trait]
impl<S: RecordSink + ?Sized> RecordSink for std::sync::Arc<S> {
    async fn insert_batch(&self, table: &str, records: &[TypedRecord]) -> anyhow::Result<u64> {
        (**self).insert_batch(table, records).await
    }

    async fn close(&self) {
        (**self).close().await;
    }
}

/// Postgres sink backed by a sqlx connection pool
pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    /// Acquire the connection pool. Failure here is run-fatal.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| EtlError::sink(format!("cannot connect: {e}")))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSink for PgSink {
    async fn insert_batch(&self, table: &str, records: &[TypedRecord]) -> anyhow::Result<u64> {
        let mut written = 0u64;

        for batch in records.chunks(INSERT_BATCH_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {table} \
                 (order_id, user_id, amount, order_date, product_id, price_category) "
            ));
            builder.push_values(batch, |mut row, record| {
                row.push_bind(record.order_id)
                    .push_bind(record.user_id)
                    .push_bind(record.amount)
                    .push_bind(record.order_date)
                    .push_bind(record.product_id.as_deref())
                    .push_bind(record.price_category.map(|c| c.as_str()));
            });

            let result = builder.build().execute(&self.pool).await?;
            written += result.rows_affected();
        }

        debug!(table, rows = written, "bulk insert complete");
        Ok(written)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Persist one chunk's admissible records as a single load attempt.
///
/// Never propagates sink errors: a failure yields `LoadOutcome::Failed`
/// carrying every record of the chunk for the fallback sink.
pub async fn load_chunk<S: RecordSink>(
    sink: &S,
    table: &str,
    records: Vec<TypedRecord>,
) -> LoadOutcome {
    if records.is_empty() {
        return LoadOutcome::Loaded(0);
    }

    match sink.insert_batch(table, &records).await {
        Ok(_) => LoadOutcome::Loaded(records.len()),
        Err(e) => {
            warn!(error = %e, rows = records.len(), "bulk insert failed, diverting chunk");
            LoadOutcome::Failed {
                error: e.to_string(),
                records,
            }
        },
    }
}
