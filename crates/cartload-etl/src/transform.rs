//! Transform stage: coercion, validation, categorization
//!
//! Coercion never fails a record: a malformed field degrades to `None` and
//! the record continues through the pipeline. Validation then decides
//! admissibility with ordered rules, and admissible records get their price
//! category derived from the amount.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::record::{PriceCategory, ProcessedChunk, RawRecord, RejectReason, TypedRecord};
use crate::schema::{BoundSchema, FieldKind};

/// Timestamp layouts accepted from the source, tried in order
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Textual sentinels treated as a missing value
fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
}

fn coerce_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    // Generators commonly emit integer ids as "1234.0"; accept the float
    // form as long as it is whole.
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64)
    })
}

fn coerce_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a timestamp, rejecting semantically invalid calendar dates
/// (e.g. "2023-13-32") by degrading to `None`.
fn coerce_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Coerce one raw record against the bound schema.
///
/// Each field converts independently; a failure degrades that field to
/// `None` without touching the others.
pub fn coerce(raw: &RawRecord, schema: &BoundSchema) -> TypedRecord {
    let mut record = TypedRecord {
        order_id: None,
        user_id: None,
        amount: None,
        order_date: None,
        product_id: None,
        price_category: None,
    };

    for (n, field) in schema.fields().iter().enumerate() {
        let value = raw.get(schema.source_index(n));
        if is_missing(value) {
            continue;
        }
        match (field.name, field.kind) {
            ("order_id", FieldKind::Integer) => record.order_id = coerce_integer(value),
            ("user_id", FieldKind::Integer) => record.user_id = coerce_integer(value),
            ("amount", FieldKind::Decimal) => record.amount = coerce_decimal(value),
            ("order_date", FieldKind::Timestamp) => record.order_date = coerce_timestamp(value),
            ("product_id", FieldKind::Text) => record.product_id = Some(value.trim().to_string()),
            _ => {},
        }
    }

    record
}

/// Apply admissibility rules in order; the first failing rule wins.
///
/// An invalid or missing `order_date` does not reject on its own: the field
/// has already degraded to `None` and the record may still load with a NULL
/// timestamp.
pub fn validate(record: &TypedRecord, bounds: (f64, f64)) -> Result<(), RejectReason> {
    if record.order_id.is_none() {
        return Err(RejectReason::MissingKey("order_id"));
    }
    if record.user_id.is_none() {
        return Err(RejectReason::MissingKey("user_id"));
    }
    match record.amount {
        Some(amount) if amount > bounds.0 && amount < bounds.1 => Ok(()),
        _ => Err(RejectReason::AmountOutOfRange),
    }
}

/// Derive the price bucket from a validated amount.
///
/// With default thresholds `[50, 100, 500]`: (0,50] micro, (50,100] small,
/// (100,500] medium, (500,inf) large. Upper bounds are inclusive.
pub fn categorize(amount: f64, thresholds: &[f64; 3]) -> PriceCategory {
    if amount <= thresholds[0] {
        PriceCategory::Micro
    } else if amount <= thresholds[1] {
        PriceCategory::Small
    } else if amount <= thresholds[2] {
        PriceCategory::Medium
    } else {
        PriceCategory::Large
    }
}

/// Run one chunk through coerce -> validate -> categorize, partitioning
/// into admissible and rejected in input order.
pub fn process_chunk(
    raw_records: &[RawRecord],
    schema: &BoundSchema,
    bounds: (f64, f64),
    thresholds: &[f64; 3],
) -> ProcessedChunk {
    let mut processed = ProcessedChunk::default();

    for raw in raw_records {
        let mut record = coerce(raw, schema);
        match validate(&record, bounds) {
            Ok(()) => {
                // Validation guarantees the amount is present and in range.
                let amount = record.amount.unwrap_or_default();
                record.price_category = Some(categorize(amount, thresholds));
                processed.admissible.push(record);
            },
            Err(reason) => {
                debug!(order_id = ?record.order_id, %reason, "record rejected");
                processed.rejected.push((record, reason));
            },
        }
    }

    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    const BOUNDS: (f64, f64) = (0.0, 100_000.0);
    const THRESHOLDS: [f64; 3] = [50.0, 100.0, 500.0];

    fn bound_schema() -> BoundSchema {
        Schema::orders()
            .bind(["order_id", "user_id", "amount", "order_date", "product_id"])
            .unwrap()
    }

    fn raw(fields: &[&str]) -> RawRecord {
        RawRecord::new(fields.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_coerce_clean_row() {
        let record = coerce(
            &raw(&["1", "10", "75", "2024-01-01 00:00:00", "P-1"]),
            &bound_schema(),
        );
        assert_eq!(record.order_id, Some(1));
        assert_eq!(record.user_id, Some(10));
        assert_eq!(record.amount, Some(75.0));
        assert!(record.order_date.is_some());
        assert_eq!(record.product_id.as_deref(), Some("P-1"));
        assert_eq!(record.price_category, None);
    }

    #[test]
    fn test_coerce_never_fails_the_record() {
        // A garbage amount degrades that field only
        let record = coerce(
            &raw(&["3", "11", "invalid", "2024-01-03 00:00:00", "P-3"]),
            &bound_schema(),
        );
        assert_eq!(record.order_id, Some(3));
        assert_eq!(record.amount, None);
        assert!(record.order_date.is_some());
    }

    #[test]
    fn test_coerce_sentinels_are_missing() {
        for sentinel in ["", "  ", "N/A", "n/a", "null", "None"] {
            let record = coerce(
                &raw(&["1", sentinel, "30", "2024-01-02 00:00:00", "P-2"]),
                &bound_schema(),
            );
            assert_eq!(record.user_id, None, "sentinel {sentinel:?}");
        }
    }

    #[test]
    fn test_coerce_invalid_calendar_date_degrades() {
        // Deliberately impossible date injected by upstream test data
        let record = coerce(
            &raw(&["1", "10", "75", "2023-13-32", "P-1"]),
            &bound_schema(),
        );
        assert_eq!(record.order_date, None);
        // The record itself is untouched
        assert_eq!(record.amount, Some(75.0));
    }

    #[test]
    fn test_coerce_accepts_date_only_form() {
        let record = coerce(
            &raw(&["1", "10", "75", "2024-06-15", "P-1"]),
            &bound_schema(),
        );
        let ts = record.order_date.unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_validate_rule_order_first_failure_wins() {
        // Both user_id and amount are bad; the key rule fires first
        let record = coerce(
            &raw(&["1", "", "invalid", "2024-01-01 00:00:00", "P-1"]),
            &bound_schema(),
        );
        assert_eq!(
            validate(&record, BOUNDS),
            Err(RejectReason::MissingKey("user_id"))
        );
    }

    #[test]
    fn test_validate_missing_amount_rejects() {
        let record = coerce(
            &raw(&["3", "11", "invalid", "2024-01-03 00:00:00", "P-3"]),
            &bound_schema(),
        );
        assert_eq!(validate(&record, BOUNDS), Err(RejectReason::AmountOutOfRange));
    }

    #[test]
    fn test_validate_bounds_are_exclusive() {
        let mut record = coerce(
            &raw(&["1", "10", "75", "2024-01-01 00:00:00", "P-1"]),
            &bound_schema(),
        );
        record.amount = Some(0.0);
        assert_eq!(validate(&record, BOUNDS), Err(RejectReason::AmountOutOfRange));
        record.amount = Some(100_000.0);
        assert_eq!(validate(&record, BOUNDS), Err(RejectReason::AmountOutOfRange));
        record.amount = Some(-12.5);
        assert_eq!(validate(&record, BOUNDS), Err(RejectReason::AmountOutOfRange));
        record.amount = Some(99_999.99);
        assert_eq!(validate(&record, BOUNDS), Ok(()));
    }

    #[test]
    fn test_validate_invalid_date_alone_does_not_reject() {
        let record = coerce(
            &raw(&["1", "10", "75", "2023-13-32", "P-1"]),
            &bound_schema(),
        );
        assert_eq!(validate(&record, BOUNDS), Ok(()));
    }

    #[test]
    fn test_categorize_boundaries() {
        assert_eq!(categorize(0.01, &THRESHOLDS), PriceCategory::Micro);
        assert_eq!(categorize(50.0, &THRESHOLDS), PriceCategory::Micro);
        assert_eq!(categorize(50.01, &THRESHOLDS), PriceCategory::Small);
        assert_eq!(categorize(100.0, &THRESHOLDS), PriceCategory::Small);
        assert_eq!(categorize(100.01, &THRESHOLDS), PriceCategory::Medium);
        assert_eq!(categorize(500.0, &THRESHOLDS), PriceCategory::Medium);
        assert_eq!(categorize(500.01, &THRESHOLDS), PriceCategory::Large);
        assert_eq!(categorize(99_999.99, &THRESHOLDS), PriceCategory::Large);
    }

    #[test]
    fn test_process_chunk_partitions_in_order() {
        let rows = vec![
            raw(&["1", "10", "75", "2024-01-01 00:00:00", "P-1"]),
            raw(&["2", "", "30", "2024-01-02 00:00:00", "P-2"]),
            raw(&["3", "11", "invalid", "2024-01-03 00:00:00", "P-3"]),
        ];
        let processed = process_chunk(&rows, &bound_schema(), BOUNDS, &THRESHOLDS);

        assert_eq!(processed.total(), 3);
        assert_eq!(processed.admissible.len(), 1);
        assert_eq!(processed.admissible[0].order_id, Some(1));
        assert_eq!(
            processed.admissible[0].price_category,
            Some(PriceCategory::Small)
        );

        assert_eq!(processed.rejected.len(), 2);
        assert_eq!(processed.rejected[0].1, RejectReason::MissingKey("user_id"));
        assert_eq!(processed.rejected[1].1, RejectReason::AmountOutOfRange);
    }
}
