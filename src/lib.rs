//! # Rowmap - Row/Object Mapping Layer
//!
//! A generic data-access layer between domain objects and a SQLite-family
//! datastore.
//!
//! Rowmap provides:
//! - Identity-mapped entity caching: at most one live object per primary key
//! - Field-level dirty tracking driving minimal UPDATE statements
//! - Dynamic SQL generation from a table schema discovered at runtime
//! - Versioned schema migrations with resumable, non-transactional apply
//! - Bulk import/reconciliation of externally sourced row sets

pub mod coltype;
pub mod db;
pub mod import;
pub mod mapper;
pub mod registry;
pub mod row;
pub mod schema;
pub mod statement;
pub mod value;

// Re-exports for convenient access
pub use coltype::ColumnType;
pub use db::{Cursor, Database, SqliteDb};
pub use import::{ImportHooks, Importer, NoHooks};
pub use mapper::{RecordMapper, RecordRowMapper};
pub use registry::{EntityRegistry, Shared};
pub use row::Record;
pub use schema::{MigrationGroup, SchemaCatalog, TableSchema};
pub use statement::StatementBuilder;
pub use value::Value;

/// Result type alias for rowmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for rowmap operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Migration to version {version} failed: {message}")]
    Migration { version: i64, message: String },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Duplicate key: entity {0} is already inserted")]
    DuplicateKey(i64),

    #[error("Entity {0} has not been loaded")]
    NotLoaded(i64),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Statement error: {0}")]
    Statement(String),

    #[error("Unsupported query: {0}")]
    Unsupported(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Statement(e.to_string())
    }
}
