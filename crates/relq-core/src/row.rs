//! Result rows.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// An ordered set of named column values, as produced by a statement executor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row from parallel column/value vectors.
    ///
    /// Callers are expected to keep the vectors the same length; executors
    /// building rows from a select list always do.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names in select-list order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in select-list order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Position of a named column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of a named column.
    pub fn named(&self, name: &str) -> Result<&Value> {
        self.position(name)
            .map(|i| &self.values[i])
            .ok_or_else(|| Error::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Sub-row of every column under a dotted prefix, with the prefix
    /// stripped. Used to hand fetch-joined columns to the related record.
    pub fn scoped(&self, prefix: &str) -> Row {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (c, v) in self.columns.iter().zip(&self.values) {
            if let Some(rest) = c.strip_prefix(prefix).and_then(|r| r.strip_prefix('.')) {
                columns.push(rest.to_string());
                values.push(v.clone());
            }
        }
        Row { columns, values }
    }
}
