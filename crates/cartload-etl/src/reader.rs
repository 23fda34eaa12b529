//! Chunked delimited-source reader
//!
//! Streams a finite, forward-only sequence of fixed-size chunks without ever
//! materializing the whole file. The header row is read and bound against
//! the target schema at open time; structural parse errors (unreadable file,
//! malformed quoting, ragged rows) are fatal for the run, never per-row.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cartload_common::{EtlError, Result};
use tracing::debug;

use crate::record::RawRecord;
use crate::schema::{BoundSchema, Schema};

/// Forward-only chunked reader over a delimited source.
///
/// Not restartable: once `next_chunk` returns `None` the stream is
/// exhausted. A partial trailing chunk is valid and terminal.
#[derive(Debug)]
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    schema: BoundSchema,
    chunk_size: usize,
    chunks_read: u64,
    done: bool,
}

impl ChunkReader<File> {
    /// Open a delimited file and bind the target schema to its header row.
    pub fn open(path: impl AsRef<Path>, schema: Schema, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| EtlError::source(format!("cannot open '{}': {e}", path.display())))?;
        Self::from_reader(file, schema, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Build a chunk reader over any byte source (files, test doubles).
    pub fn from_reader(source: R, schema: Schema, chunk_size: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| EtlError::source(format!("cannot read header row: {e}")))?;
        let schema = schema.bind(headers.iter())?;

        Ok(Self {
            reader,
            schema,
            chunk_size,
            chunks_read: 0,
            done: false,
        })
    }

    /// The schema bound to this source's header
    pub fn schema(&self) -> &BoundSchema {
        &self.schema
    }

    /// Read the next chunk, at most `chunk_size` rows.
    ///
    /// Returns `Ok(None)` at end of stream. A CSV structural error aborts
    /// the stream and is returned as a fatal source error.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<RawRecord>>> {
        if self.done {
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(self.chunk_size);
        let mut record = csv::StringRecord::new();

        while rows.len() < self.chunk_size {
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    rows.push(RawRecord::new(record.iter().map(str::to_string).collect()));
                },
                Ok(false) => {
                    self.done = true;
                    break;
                },
                Err(e) => {
                    self.done = true;
                    return Err(EtlError::source(format!("malformed row: {e}")));
                },
            }
        }

        if rows.is_empty() {
            return Ok(None);
        }

        self.chunks_read += 1;
        debug!(chunk = self.chunks_read, rows = rows.len(), "chunk read");
        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "order_id,user_id,amount,order_date,product_id\n";

    fn source_with_rows(n: usize) -> String {
        let mut csv = String::from(HEADER);
        for i in 0..n {
            csv.push_str(&format!("{i},10,75,2024-01-01 00:00:00,P-{i}\n"));
        }
        csv
    }

    #[test]
    fn test_chunking_with_partial_trailing_chunk() {
        let data = source_with_rows(7);
        let mut reader =
            ChunkReader::from_reader(data.as_bytes(), Schema::orders(), 3).unwrap();

        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 3);
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 3);
        // Partial trailing chunk is valid and terminal
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 1);
        assert!(reader.next_chunk().unwrap().is_none());
        // Exhausted stream stays exhausted
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_empty_source_yields_no_chunks() {
        let mut reader =
            ChunkReader::from_reader(HEADER.as_bytes(), Schema::orders(), 3).unwrap();
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_missing_column_fails_at_open() {
        let data = "order_id,user_id,order_date,product_id\n1,10,2024-01-01,P-1\n";
        let err =
            ChunkReader::from_reader(data.as_bytes(), Schema::orders(), 3).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let data = format!("{HEADER}1,10,75\n");
        let mut reader =
            ChunkReader::from_reader(data.as_bytes(), Schema::orders(), 3).unwrap();
        assert!(reader.next_chunk().is_err());
    }

    #[test]
    fn test_rows_keep_source_column_order() {
        let data = "amount,order_id,user_id,order_date,product_id\n75,1,10,2024-01-01 00:00:00,P-1\n";
        let mut reader =
            ChunkReader::from_reader(data.as_bytes(), Schema::orders(), 10).unwrap();
        let rows = reader.next_chunk().unwrap().unwrap();
        let schema = reader.schema();
        // order_id is schema field 0, bound to source column 1
        assert_eq!(rows[0].get(schema.source_index(0)), "1");
        assert_eq!(rows[0].get(schema.source_index(2)), "75");
    }
}
