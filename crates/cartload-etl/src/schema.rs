//! Static schema descriptor for the order-record source
//!
//! The target schema is declared once and bound against the source's header
//! row at open time. Column order in the file may differ from schema order;
//! lookup is by name. A missing column fails the run before any row is read,
//! never as a per-row surprise later.

use cartload_common::{EtlError, Result};

/// Semantic type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole-number identifier
    Integer,
    /// Decimal amount
    Decimal,
    /// Calendar timestamp
    Timestamp,
    /// Free-form text
    Text,
}

/// One column of the target schema
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Ordered target schema for a delimited source
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// The commerce order-record schema.
    ///
    /// Field order here is the stable output order used by the sink table
    /// and the error file.
    pub fn orders() -> Self {
        Self {
            fields: vec![
                FieldSpec { name: "order_id", kind: FieldKind::Integer },
                FieldSpec { name: "user_id", kind: FieldKind::Integer },
                FieldSpec { name: "amount", kind: FieldKind::Decimal },
                FieldSpec { name: "order_date", kind: FieldKind::Timestamp },
                FieldSpec { name: "product_id", kind: FieldKind::Text },
            ],
        }
    }

    /// Schema fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Resolve each schema field to its column index in the source header.
    ///
    /// Header order need not match schema order. Every schema column must be
    /// present; extra source columns are ignored.
    pub fn bind<'h, I>(self, headers: I) -> Result<BoundSchema>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();

        let indices = self
            .fields
            .iter()
            .map(|field| {
                headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(field.name))
                    .ok_or_else(|| {
                        EtlError::schema(format!("missing column '{}'", field.name))
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(BoundSchema { schema: self, indices })
    }
}

/// A schema resolved against a concrete source header
#[derive(Debug, Clone)]
pub struct BoundSchema {
    schema: Schema,
    /// Source column index for each schema field, in schema order
    indices: Vec<usize>,
}

impl BoundSchema {
    /// Schema fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        self.schema.fields()
    }

    /// Source column index of the `n`-th schema field
    pub fn source_index(&self, n: usize) -> usize {
        self.indices[n]
    }

    /// Number of schema fields
    pub fn len(&self) -> usize {
        self.schema.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_in_schema_order() {
        let bound = Schema::orders()
            .bind(["order_id", "user_id", "amount", "order_date", "product_id"])
            .unwrap();
        assert_eq!(bound.len(), 5);
        for i in 0..5 {
            assert_eq!(bound.source_index(i), i);
        }
    }

    #[test]
    fn test_bind_shuffled_header() {
        let bound = Schema::orders()
            .bind(["product_id", "amount", "order_id", "order_date", "user_id"])
            .unwrap();
        // order_id lives at source column 2
        assert_eq!(bound.source_index(0), 2);
        // amount at source column 1
        assert_eq!(bound.source_index(2), 1);
    }

    #[test]
    fn test_bind_ignores_extra_columns_and_case() {
        let bound = Schema::orders()
            .bind(["Order_ID", "user_id", "amount", "order_date", "product_id", "phone"])
            .unwrap();
        assert_eq!(bound.source_index(0), 0);
    }

    #[test]
    fn test_bind_missing_column_is_fatal() {
        let err = Schema::orders()
            .bind(["order_id", "user_id", "order_date", "product_id"])
            .unwrap_err();
        assert!(err.to_string().contains("amount"));
    }
}
