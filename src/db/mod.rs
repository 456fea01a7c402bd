//! Datastore boundary - the SQL execution seam
//!
//! The mapping layer talks to its datastore exclusively through the
//! [`Database`] and [`Cursor`] traits: parameterized execute, parameterized
//! query, forward-only row cursor. A backend that cannot answer a given
//! query form (PRAGMA-style introspection on restricted engines) reports
//! `Error::Unsupported`, which upper layers treat as a fallback trigger
//! rather than a failure.

pub mod sqlite;

pub use sqlite::{BufferedCursor, SqliteDb};

use crate::Result;
use crate::value::Value;

/// Forward-only cursor over a query result.
///
/// A cursor starts positioned before the first row; each [`Cursor::advance`]
/// moves to the next row and reports whether one exists.
pub trait Cursor {
    /// Advance to the next row. Returns false when the result set is
    /// exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Number of columns in the result set
    fn column_count(&self) -> usize;

    /// Name of the column at `idx`
    fn column_name(&self, idx: usize) -> Option<&str>;

    /// Read the value of the column at `idx` in the current row
    fn get(&self, idx: usize) -> Result<Value>;
}

/// A synchronous SQL datastore.
pub trait Database {
    /// Execute a statement that returns no rows
    fn execute(&self, sql: &str, params: &[Value]) -> Result<()>;

    /// Execute a query and return a cursor over its rows
    fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn Cursor>>;
}
