//! Metadata row data structures.
//!
//! This module defines the normalized row handed from the loader to the normalizer.

use crate::fields::Field;
use csv::StringRecord;
use std::collections::HashMap;

/// One row of a DSpace metadata export.
///
/// Values are normalized at ingestion: empty cells are dropped, so every lookup
/// answers either `Some(non_empty_value)` or `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Non-empty values keyed by column name; the first column wins on duplicate headers
    fields: HashMap<String, String>,
    /// Non-empty values by column position
    columns: Vec<Option<String>>,
    /// Line number in the source file, for error reporting
    line_number: usize,
}

impl RawRow {
    /// Create a row from a CSV record and its headers.
    pub(crate) fn from_record(
        headers: &[String],
        record: &StringRecord,
        trim: bool,
        line_number: usize,
    ) -> Self {
        let mut fields = HashMap::new();
        let mut columns = Vec::with_capacity(record.len());

        for (i, value) in record.iter().enumerate() {
            let value = if trim { value.trim() } else { value };
            if value.is_empty() {
                columns.push(None);
                continue;
            }
            columns.push(Some(value.to_string()));
            if let Some(header) = headers.get(i) {
                fields
                    .entry(header.clone())
                    .or_insert_with(|| value.to_string());
            }
        }

        Self {
            fields,
            columns,
            line_number,
        }
    }

    /// Build a row from column/value pairs, in column order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (headers, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::from_record(&headers, &StringRecord::from(values), false, 1)
    }

    /// Get a value by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Get the first present value among the columns of a field.
    pub fn field(&self, field: Field) -> Option<&str> {
        field.columns().iter().find_map(|column| self.get(column))
    }

    /// Get a value by column position.
    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(Option::as_deref)
    }

    /// Line number of the row in its source file.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Check if the row has any content at all.
    pub fn has_content(&self) -> bool {
        self.columns.iter().any(Option::is_some)
    }
}
