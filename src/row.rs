//! Record - an ordered column/value mapping
//!
//! Rows travel through the layer as [`Record`]s: between cursors and
//! mappers, between mappers and statement builders, and as the generic
//! entity representation itself. Insertion order is preserved so statement
//! text and argument lists are always built from the same column ordering.

use crate::value::Value;

/// An ordered mapping from column name to [`Value`].
///
/// Lookup is linear; rows are small. Setting an existing column replaces
/// its value in place without disturbing the order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns in the record
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the record has no columns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the record has a value (including NULL) for the column
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == column)
    }

    /// Get the value for a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Set a column value, replacing any existing value in place
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == column) {
            entry.1 = value;
        } else {
            self.entries.push((column, value));
        }
    }

    /// Remove a column, returning its value if present
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(idx).1)
    }

    /// Copy every column of `other` into this record (overwriting matches)
    pub fn merge(&mut self, other: &Record) {
        for (column, value) in other.iter() {
            self.set(column, value.clone());
        }
    }

    /// Iterate over columns in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterate over column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Build a record from a parsed JSON object
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Record {
        let mut record = Record::new();
        for (column, value) in object {
            record.set(column.clone(), Value::from_json(value));
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}
