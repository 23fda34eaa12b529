//! Record types flowing through the pipeline
//!
//! Every stage returns new values rather than mutating its input; a
//! `RawRecord` is immutable once read and a `TypedRecord` is rebuilt rather
//! than patched. Missing or unparseable fields are explicit `None`, never a
//! silent zero.

use chrono::NaiveDateTime;

/// One input row, raw text fields in schema order. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<String>,
}

impl RawRecord {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Raw text of the `n`-th schema field
    pub fn get(&self, n: usize) -> &str {
        &self.fields[n]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Price bucket derived from the order amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceCategory {
    Micro,
    Small,
    Medium,
    Large,
}

impl PriceCategory {
    /// Stable label used in the sink table
    pub fn as_str(self) -> &'static str {
        match self {
            PriceCategory::Micro => "micro",
            PriceCategory::Small => "small",
            PriceCategory::Medium => "medium",
            PriceCategory::Large => "large",
        }
    }
}

impl std::fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced order record.
///
/// `None` marks a field that was empty, a sentinel ("N/A"), or failed
/// coercion. `price_category` is set only after validation passes.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord {
    pub order_id: Option<i64>,
    pub user_id: Option<i64>,
    pub amount: Option<f64>,
    pub order_date: Option<NaiveDateTime>,
    pub product_id: Option<String>,
    pub price_category: Option<PriceCategory>,
}

/// Why a record was excluded from loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A required identifier is missing
    MissingKey(&'static str),
    /// Amount is missing, non-numeric, or outside the admissible range
    AmountOutOfRange,
}

impl RejectReason {
    /// Stable reason code for counters and the error file
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::MissingKey(_) => "missing_key",
            RejectReason::AmountOutOfRange => "amount_out_of_range",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingKey(field) => write!(f, "missing_key:{field}"),
            RejectReason::AmountOutOfRange => f.write_str("amount_out_of_range"),
        }
    }
}

/// A chunk after transform and validation, partitioned in input order
#[derive(Debug, Clone, Default)]
pub struct ProcessedChunk {
    /// Records that passed validation, categorized and ready to load
    pub admissible: Vec<TypedRecord>,
    /// Records excluded by validation, with the first failing rule
    pub rejected: Vec<(TypedRecord, RejectReason)>,
}

impl ProcessedChunk {
    /// Total records in this chunk across both partitions
    pub fn total(&self) -> usize {
        self.admissible.len() + self.rejected.len()
    }
}

/// Result of persisting one chunk's admissible records
#[derive(Debug)]
pub enum LoadOutcome {
    /// All records were handed to the sink
    Loaded(usize),
    /// The sink failed; the whole admissible set is returned for fallback
    Failed {
        error: String,
        records: Vec<TypedRecord>,
    },
}
