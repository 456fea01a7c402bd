//! SQLite datastore implementation

use std::collections::VecDeque;
use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::value::Value;
use crate::{Error, Result};

use super::{Cursor, Database};

/// SQLite-backed [`Database`]
pub struct SqliteDb {
    conn: Connection,
}

impl SqliteDb {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }
}

impl Database for SqliteDb {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<()> {
        self.conn
            .execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn Cursor>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        // rusqlite rows borrow the statement, which borrows the connection;
        // buffering the result set keeps the cursor free of those lifetimes.
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut buffered = VecDeque::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(value_from_ref(row.get_ref(idx)?));
            }
            buffered.push_back(values);
        }

        Ok(Box::new(BufferedCursor::new(columns, buffered)))
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::ToSqlOutput;
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// A [`Cursor`] over a fully materialized result set.
///
/// Also the building block for test doubles: any `Database` implementation
/// can hand back one of these.
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl BufferedCursor {
    /// Create a cursor over pre-fetched rows
    pub fn new(columns: Vec<String>, rows: VecDeque<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            current: None,
        }
    }
}

impl Cursor for BufferedCursor {
    fn advance(&mut self) -> Result<bool> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).map(|s| s.as_str())
    }

    fn get(&self, idx: usize) -> Result<Value> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| Error::InvalidState("cursor is not positioned on a row".into()))?;
        row.get(idx)
            .cloned()
            .ok_or_else(|| Error::Statement(format!("column index {} out of range", idx)))
    }
}
