//! Schema catalog - table metadata, versioned migrations, introspection
//!
//! The catalog owns everything the layer knows about the datastore's shape:
//! - parsing a versioned migration script into ordered statement groups
//! - the installed-version watermark, persisted in the datastore itself
//! - applying pending migration groups (non-transactional, resumable)
//! - per-table column discovery, structured where the engine allows it and
//!   falling back to CREATE TABLE text parsing where it does not
//!
//! Migration script format: a line of exactly `--` flushes the pending
//! statement buffer as one statement; `--version:N` opens the group for
//! version N; everything else accumulates newline-preserved.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::OnceLock;

use regex::Regex;

use crate::coltype::ColumnType;
use crate::db::Database;
use crate::value::Value;
use crate::{Error, Result};

/// Version watermark table, fixed by convention; auto-created on first read.
const CREATE_VERSION_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS database_version (version_number INTEGER PRIMARY KEY)";
const SELECT_VERSION: &str = "SELECT version_number FROM database_version";
const INIT_VERSION: &str = "INSERT INTO database_version (version_number) VALUES (0)";
const UPDATE_VERSION: &str = "UPDATE database_version SET version_number=?";

/// Column-definition segments starting with these keywords are table-level
/// constraints, not columns.
const CONSTRAINT_KEYWORDS: &[&str] = &["PRIMARY", "KEY", "INDEX", "CONSTRAINT", "FOREIGN"];

fn version_directive() -> &'static Regex {
    static DIRECTIVE: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE.get_or_init(|| Regex::new(r"(?i)^--version:(.*)$").expect("valid directive regex"))
}

/// One named, typed column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub col_type: ColumnType,
}

/// Ordered column metadata for one table, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, col_type: ColumnType) {
        self.columns.push(Column {
            name: name.into(),
            col_type,
        });
    }

    /// Iterate columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Look up a column's type by name
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|col| col.name == name)
            .map(|col| col.col_type)
    }

    /// True if the schema has a column with this name
    pub fn contains(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if no columns were discovered
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnType)> for TableSchema {
    fn from_iter<I: IntoIterator<Item = (S, ColumnType)>>(iter: I) -> Self {
        let mut schema = TableSchema::new();
        for (name, col_type) in iter {
            schema.push(name, col_type);
        }
        schema
    }
}

/// The SQL statements migrating a schema up to one target version.
#[derive(Debug, Clone)]
pub struct MigrationGroup {
    pub version: i64,
    pub statements: Vec<String>,
}

/// Catalog of table schemas and the migration machinery maintaining them.
pub struct SchemaCatalog {
    script: String,
    target_version: i64,
    tables: HashMap<String, TableSchema>,
    migrated: bool,
}

impl SchemaCatalog {
    /// Create a catalog for a migration script and target schema version.
    /// Nothing touches the datastore until the first [`SchemaCatalog::migrate`]
    /// or [`SchemaCatalog::table_schema`] call.
    pub fn new(script: impl Into<String>, target_version: i64) -> Self {
        Self {
            script: script.into(),
            target_version,
            tables: HashMap::new(),
            migrated: false,
        }
    }

    /// Create a catalog by reading the migration script from a file
    pub fn from_script_file(
        path: impl AsRef<std::path::Path>,
        target_version: i64,
    ) -> Result<Self> {
        let script = std::fs::read_to_string(path)?;
        Ok(Self::new(script, target_version))
    }

    /// The configured target schema version
    pub fn target_version(&self) -> i64 {
        self.target_version
    }

    /// Parse migration script text into version-tagged statement groups,
    /// in script order. Empty statements are discarded. A directive whose
    /// version is not a non-negative integer is a schema error.
    pub fn parse_migrations(text: &str) -> Result<Vec<MigrationGroup>> {
        let mut groups: Vec<MigrationGroup> = Vec::new();
        let mut version = 0i64;
        let mut statements: Vec<String> = Vec::new();
        let mut buffer = String::new();

        let flush_buffer = |buffer: &mut String, statements: &mut Vec<String>| {
            if !buffer.trim().is_empty() {
                statements.push(std::mem::take(buffer));
            } else {
                buffer.clear();
            }
        };

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed == "--" {
                flush_buffer(&mut buffer, &mut statements);
            } else if let Some(captures) = version_directive().captures(trimmed) {
                flush_buffer(&mut buffer, &mut statements);
                let tag = captures[1].trim().to_string();
                let next: i64 = tag
                    .parse()
                    .map_err(|_| Error::Schema(format!("malformed version directive: {}", trimmed)))?;
                if next < 0 {
                    return Err(Error::Schema(format!(
                        "malformed version directive: {}",
                        trimmed
                    )));
                }
                if next != version {
                    if !statements.is_empty() {
                        groups.push(MigrationGroup {
                            version,
                            statements: std::mem::take(&mut statements),
                        });
                    }
                    version = next;
                }
            } else {
                buffer.push_str(line);
                buffer.push('\n');
            }
        }
        flush_buffer(&mut buffer, &mut statements);
        if !statements.is_empty() {
            groups.push(MigrationGroup {
                version,
                statements,
            });
        }

        Ok(groups)
    }

    /// Read the installed schema version, creating the watermark table (and
    /// its single zero row) when absent. Idempotent.
    pub fn installed_version(&self, db: &dyn Database) -> Result<i64> {
        db.execute(CREATE_VERSION_TABLE, &[])?;
        let mut cursor = db.query(SELECT_VERSION, &[])?;
        if cursor.advance()? {
            Ok(cursor.get(0)?.as_i64())
        } else {
            db.execute(INIT_VERSION, &[])?;
            Ok(0)
        }
    }

    fn set_installed_version(&self, db: &dyn Database, version: i64) -> Result<()> {
        db.execute(UPDATE_VERSION, &[Value::Integer(version)])
    }

    /// Bring the datastore up to the target version by applying every
    /// pending migration group in ascending version order, persisting the
    /// watermark after each group.
    ///
    /// Not transactional: a failing statement leaves its group partially
    /// applied and surfaces immediately. Re-invoking resumes from the last
    /// recorded version.
    pub fn migrate(&mut self, db: &dyn Database) -> Result<()> {
        if self.migrated {
            return Ok(());
        }
        let mut installed = self.installed_version(db)?;
        if self.target_version > installed {
            let mut groups = Self::parse_migrations(&self.script)?;
            groups.sort_by_key(|group| group.version);
            for group in &groups {
                if group.version <= installed {
                    continue;
                }
                tracing::info!(
                    "migrating schema from version {} to {}",
                    installed,
                    group.version
                );
                for statement in &group.statements {
                    tracing::debug!("migration statement: {}", statement.trim());
                    db.execute(statement, &[]).map_err(|e| Error::Migration {
                        version: group.version,
                        message: e.to_string(),
                    })?;
                }
                self.set_installed_version(db, group.version)?;
                installed = group.version;
            }
            self.set_installed_version(db, self.target_version)?;
        }
        self.migrated = true;
        Ok(())
    }

    /// Get (discovering on first use) the column metadata for a table.
    /// Runs pending migrations first. Discovery prefers the structured
    /// describe-columns query and falls back to parsing the table's CREATE
    /// TABLE text when the engine reports that form as unsupported.
    pub fn table_schema(&mut self, db: &dyn Database, table: &str) -> Result<&TableSchema> {
        self.migrate(db)?;
        match self.tables.entry(table.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let discovered = match describe_columns(db, table) {
                    Err(Error::Unsupported(reason)) => {
                        tracing::debug!(
                            "structured introspection unavailable for {} ({}), parsing CREATE TABLE text",
                            table,
                            reason
                        );
                        parse_create_table(db, table)?
                    }
                    other => other?,
                };
                Ok(entry.insert(discovered))
            }
        }
    }
}

/// Structured introspection: PRAGMA-style describe-columns query.
fn describe_columns(db: &dyn Database, table: &str) -> Result<TableSchema> {
    let mut cursor = db.query(&format!("PRAGMA table_info(\"{}\")", table), &[])?;
    let mut schema = TableSchema::new();
    // Rows are (cid, name, type, notnull, dflt_value, pk) in column order.
    while cursor.advance()? {
        let name = cursor.get(1)?.as_text();
        let decl = cursor.get(2)?.as_text();
        schema.push(name, ColumnType::normalize(&decl));
    }
    Ok(schema)
}

/// Fallback introspection: read the table's CREATE TABLE text from the
/// catalog and tokenize its column list.
fn parse_create_table(db: &dyn Database, table: &str) -> Result<TableSchema> {
    let mut cursor = db.query(
        "SELECT sql FROM sqlite_master WHERE type='table' AND name=?",
        &[Value::Text(table.to_string())],
    )?;
    let mut schema = TableSchema::new();
    if !cursor.advance()? {
        return Ok(schema);
    }
    let sql = cursor.get(0)?.as_text();

    // Collapse all whitespace runs, then work on the text inside the
    // outermost parentheses.
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    let body = match flat.find('(') {
        Some(pos) => &flat[pos + 1..],
        None => return Ok(schema),
    };

    for segment in split_top_level_commas(body) {
        let words: Vec<&str> = segment.split_whitespace().collect();
        let Some(first) = words.first() else {
            continue;
        };
        if CONSTRAINT_KEYWORDS.contains(&first.to_ascii_uppercase().as_str()) {
            continue;
        }
        if words.len() < 2 {
            continue;
        }
        let name = first.trim_matches('"');
        schema.push(name, ColumnType::normalize(&words[1..].join(" ")));
    }
    Ok(schema)
}

/// Split a CREATE TABLE body on commas at parenthesis depth zero, so typed
/// declarations like DECIMAL(10,2) stay in one segment.
fn split_top_level_commas(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                segments.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&body[start..]);
    segments
}
