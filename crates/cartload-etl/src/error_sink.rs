//! Append-only fallback file for unloadable records
//!
//! Records diverted by a failed bulk load land here for later inspection.
//! The file is created lazily on the first failure, the header is written
//! only when the file is new, and the field order is stable across appends.
//!
//! Best-effort by contract: a failure to record errors is logged and
//! swallowed so diagnostics never amplify an outage.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::warn;

use crate::record::TypedRecord;

/// Stable column order of the error file
const ERROR_FILE_HEADER: &[&str] = &[
    "order_id",
    "user_id",
    "amount",
    "order_date",
    "product_id",
    "reason",
];

/// Lazily-created append-only CSV sink for failed records
pub struct CsvErrorSink {
    path: PathBuf,
    writer: Option<csv::Writer<std::fs::File>>,
}

impl CsvErrorSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    /// Path of the error file (may not exist yet)
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append records with a reason code. Never fails the caller.
    pub fn record(&mut self, records: &[TypedRecord], reason: &str) {
        if records.is_empty() {
            return;
        }
        if let Err(e) = self.try_record(records, reason) {
            warn!(error = %e, path = %self.path.display(), rows = records.len(),
                "could not record failed rows, dropping");
        }
    }

    fn try_record(&mut self, records: &[TypedRecord], reason: &str) -> std::io::Result<()> {
        if self.writer.is_none() {
            self.writer = Some(Self::open_writer(&self.path)?);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        for record in records {
            writer.write_record([
                record.order_id.map(|v| v.to_string()).unwrap_or_default(),
                record.user_id.map(|v| v.to_string()).unwrap_or_default(),
                record.amount.map(|v| v.to_string()).unwrap_or_default(),
                record
                    .order_date
                    .map(|v| v.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                record.product_id.clone().unwrap_or_default(),
                reason.to_string(),
            ])?;
        }
        writer.flush()
    }

    fn open_writer(path: &std::path::Path) -> std::io::Result<csv::Writer<std::fs::File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        // Header only when the file is new, so appends across runs stay
        // parseable as one document.
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(ERROR_FILE_HEADER)?;
        }

        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_id: i64, amount: f64) -> TypedRecord {
        TypedRecord {
            order_id: Some(order_id),
            user_id: Some(10),
            amount: Some(amount),
            order_date: None,
            product_id: Some("P-9".to_string()),
            price_category: None,
        }
    }

    #[test]
    fn test_file_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");

        let mut sink = CsvErrorSink::new(&path);
        assert!(!path.exists());

        sink.record(&[], "load_failed");
        assert!(!path.exists(), "empty append must not create the file");

        sink.record(&[record(1, 75.0)], "load_failed");
        assert!(path.exists());
    }

    #[test]
    fn test_single_header_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");

        let mut sink = CsvErrorSink::new(&path);
        sink.record(&[record(1, 75.0)], "load_failed");
        sink.record(&[record(2, 30.0)], "load_failed");
        // A fresh sink over an existing file must not repeat the header
        let mut reopened = CsvErrorSink::new(&path);
        reopened.record(&[record(3, 12.0)], "load_failed");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "order_id,user_id,amount,order_date,product_id,reason");
        assert!(lines[1].starts_with("1,10,75"));
        assert!(lines[3].starts_with("3,10,12"));
        assert!(lines.iter().skip(1).all(|l| l.ends_with("load_failed")));
    }

    #[test]
    fn test_missing_fields_serialize_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");

        let mut sink = CsvErrorSink::new(&path);
        let record = TypedRecord {
            order_id: Some(7),
            user_id: None,
            amount: None,
            order_date: None,
            product_id: None,
            price_category: None,
        };
        sink.record(&[record], "load_failed");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().nth(1).unwrap().starts_with("7,,,,,"));
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let mut sink = CsvErrorSink::new("/nonexistent-dir/errors.csv");
        // Must not panic or return an error to the caller
        sink.record(&[record(1, 75.0)], "load_failed");
    }
}
