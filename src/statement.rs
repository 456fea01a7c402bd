//! Statement builder - parameterized SQL from schema metadata
//!
//! Builders return the SQL text together with the ordered list of column
//! names it was built from; callers bind arguments by walking that same
//! list, so statement text and argument positions can never drift apart.

use std::collections::BTreeSet;

use crate::row::Record;
use crate::schema::TableSchema;
use crate::value::Value;
use crate::{Error, Result};

/// Primary key column, fixed by convention: every mapped table has an
/// auto-assigned integer column named `id`.
pub const ID_COLUMN: &str = "id";

/// Builds INSERT/UPDATE/SELECT statements for one table from its schema.
pub struct StatementBuilder<'a> {
    table: &'a str,
    schema: &'a TableSchema,
}

impl<'a> StatementBuilder<'a> {
    /// Create a builder for a table and its discovered schema
    pub fn new(table: &'a str, schema: &'a TableSchema) -> Self {
        Self { table, schema }
    }

    /// Build an INSERT over every known column, skipping the primary key
    /// when the row carries no assigned value for it (absent, NULL, or ≤ 0)
    /// so the datastore assigns one.
    pub fn insert(&self, row: &Record) -> (String, Vec<String>) {
        let columns: Vec<String> = self
            .schema
            .columns()
            .filter(|col| {
                if col.name != ID_COLUMN {
                    return true;
                }
                match row.get(ID_COLUMN) {
                    None | Some(Value::Null) => false,
                    Some(value) => value.as_i64() > 0,
                }
            })
            .map(|col| col.name.clone())
            .collect();

        let mut sql = String::new();
        sql.push_str("INSERT INTO \"");
        sql.push_str(self.table);
        sql.push_str("\" (");
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push('"');
            sql.push_str(name);
            sql.push('"');
        }
        sql.push_str(") VALUES (");
        for i in 0..columns.len() {
            if i > 0 {
                sql.push(',');
            }
            sql.push('?');
        }
        sql.push(')');

        (sql, columns)
    }

    /// Build an UPDATE over the given dirty columns only. The set iterates
    /// in lexicographic order, so the same dirty set always produces the
    /// same statement text. The primary key is bound after the returned
    /// columns, for the WHERE clause.
    pub fn update_dirty(&self, dirty: &BTreeSet<String>) -> Result<(String, Vec<String>)> {
        if dirty.is_empty() {
            return Err(Error::InvalidState(
                "cannot build an update statement when no fields are dirty".into(),
            ));
        }
        Ok(self.update_over(dirty.iter().cloned().collect()))
    }

    /// Build an UPDATE covering every known column, for entities without
    /// field-level dirty tracking.
    pub fn update_all(&self) -> (String, Vec<String>) {
        self.update_over(self.schema.columns().map(|col| col.name.clone()).collect())
    }

    fn update_over(&self, columns: Vec<String>) -> (String, Vec<String>) {
        let mut sql = String::new();
        sql.push_str("UPDATE \"");
        sql.push_str(self.table);
        sql.push_str("\" SET ");
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('"');
            sql.push_str(name);
            sql.push_str("\"=?");
        }
        sql.push_str(" WHERE id=?");
        (sql, columns)
    }

    /// SELECT a single row by primary key
    pub fn select_by_id(&self) -> String {
        format!("SELECT * FROM \"{}\" WHERE id=?", self.table)
    }

    /// SELECT every row of the table
    pub fn select_all(&self) -> String {
        format!("SELECT * FROM \"{}\"", self.table)
    }

    /// SELECT rows matching AND-joined equality predicates over the given
    /// columns, in caller-supplied order.
    pub fn select_where(&self, columns: &[&str]) -> String {
        let mut sql = format!("SELECT * FROM \"{}\" WHERE ", self.table);
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            sql.push('"');
            sql.push_str(name);
            sql.push_str("\"=?");
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coltype::ColumnType;

    fn widget_schema() -> TableSchema {
        [
            ("id", ColumnType::Integer),
            ("name", ColumnType::String),
            ("price", ColumnType::Double),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_insert_skips_unassigned_id() {
        let schema = widget_schema();
        let builder = StatementBuilder::new("widget", &schema);

        let row: Record = [("name", Value::from("anvil"))].into_iter().collect();
        let (sql, columns) = builder.insert(&row);
        assert_eq!(sql, "INSERT INTO \"widget\" (\"name\",\"price\") VALUES (?,?)");
        assert_eq!(columns, vec!["name", "price"]);

        let mut zero = row.clone();
        zero.set("id", 0i64);
        assert_eq!(builder.insert(&zero).1, vec!["name", "price"]);

        let mut negative = row.clone();
        negative.set("id", -3i64);
        assert_eq!(builder.insert(&negative).1, vec!["name", "price"]);
    }

    #[test]
    fn test_insert_keeps_assigned_id() {
        let schema = widget_schema();
        let builder = StatementBuilder::new("widget", &schema);

        let row: Record = [("id", Value::from(7i64)), ("name", Value::from("anvil"))]
            .into_iter()
            .collect();
        let (sql, columns) = builder.insert(&row);
        assert_eq!(
            sql,
            "INSERT INTO \"widget\" (\"id\",\"name\",\"price\") VALUES (?,?,?)"
        );
        assert_eq!(columns, vec!["id", "name", "price"]);
    }

    #[test]
    fn test_update_dirty_is_sorted_and_deterministic() {
        let schema = widget_schema();
        let builder = StatementBuilder::new("widget", &schema);

        let dirty: BTreeSet<String> = ["price".to_string(), "name".to_string()].into();
        let (sql, columns) = builder.update_dirty(&dirty).unwrap();
        assert_eq!(sql, "UPDATE \"widget\" SET \"name\"=?, \"price\"=? WHERE id=?");
        assert_eq!(columns, vec!["name", "price"]);
    }

    #[test]
    fn test_update_dirty_rejects_empty_set() {
        let schema = widget_schema();
        let builder = StatementBuilder::new("widget", &schema);
        let err = builder.update_dirty(&BTreeSet::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_update_all_covers_every_column() {
        let schema = widget_schema();
        let builder = StatementBuilder::new("widget", &schema);
        let (sql, columns) = builder.update_all();
        assert_eq!(
            sql,
            "UPDATE \"widget\" SET \"id\"=?, \"name\"=?, \"price\"=? WHERE id=?"
        );
        assert_eq!(columns, vec!["id", "name", "price"]);
    }

    #[test]
    fn test_selects() {
        let schema = widget_schema();
        let builder = StatementBuilder::new("widget", &schema);
        assert_eq!(builder.select_by_id(), "SELECT * FROM \"widget\" WHERE id=?");
        assert_eq!(builder.select_all(), "SELECT * FROM \"widget\"");
        assert_eq!(
            builder.select_where(&["name", "price"]),
            "SELECT * FROM \"widget\" WHERE \"name\"=? AND \"price\"=?"
        );
    }
}
