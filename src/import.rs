//! Bulk import - reconciling externally sourced row sets into a table
//!
//! An [`Importer`] upserts a list of externally produced rows through a
//! registry: each row is renamed to canonical column names, matched against
//! existing rows by the configured key columns, merged into the matching
//! entity (or a fresh one), and saved. Hooks fire around each row so
//! callers can massage data or react to saves.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::db::Database;
use crate::mapper::RecordMapper;
use crate::registry::{EntityRegistry, Shared};
use crate::row::Record;
use crate::statement::ID_COLUMN;
use crate::value::Value;
use crate::{Error, Result};

/// Callbacks around each imported row. All default to no-ops.
pub trait ImportHooks<M: RecordMapper> {
    /// Called after renaming and key injection, before the row is applied
    /// to the entity. The row may be modified.
    fn prepare_row(&mut self, _row: &mut Record) {}

    /// Called after the row was applied to the entity, before saving
    fn before_save(&mut self, _entity: &Shared<M::Entity>, _row: &Record) {}

    /// Called after the entity was saved
    fn after_save(&mut self, _entity: &Shared<M::Entity>, _row: &Record) {}
}

/// The do-nothing [`ImportHooks`] implementation
pub struct NoHooks;

impl<M: RecordMapper> ImportHooks<M> for NoHooks {}

/// Imports row sets into one registry.
pub struct Importer<'r, M: RecordMapper> {
    registry: &'r mut EntityRegistry<M>,
    key_columns: Vec<String>,
    column_map: HashMap<String, String>,
}

impl<'r, M: RecordMapper> Importer<'r, M> {
    /// Create an importer matching rows on the primary key column
    pub fn new(registry: &'r mut EntityRegistry<M>) -> Self {
        Self {
            registry,
            key_columns: vec![ID_COLUMN.to_string()],
            column_map: HashMap::new(),
        }
    }

    /// Use these canonical columns (post-rename) to look up existing rows
    pub fn with_key_columns(mut self, columns: &[&str]) -> Self {
        self.key_columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Rename an import-set column to its canonical column name. Columns
    /// without a mapping pass through unchanged.
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.column_map.insert(from.into(), to.into());
        self
    }

    /// Import a flat list of rows
    pub fn import_rows(&mut self, db: &dyn Database, rows: &[Record]) -> Result<()> {
        self.import_rows_with(db, rows, &mut NoHooks)
    }

    /// Import a flat list of rows, firing the given hooks around each one
    pub fn import_rows_with(
        &mut self,
        db: &dyn Database,
        rows: &[Record],
        hooks: &mut dyn ImportHooks<M>,
    ) -> Result<()> {
        for row in rows {
            let mut canonical = Record::new();
            for (column, value) in row.iter() {
                let name = self
                    .column_map
                    .get(column)
                    .map(String::as_str)
                    .unwrap_or(column);
                canonical.set(name, value.clone());
            }

            let query: Vec<(&str, Value)> = self
                .key_columns
                .iter()
                .map(|column| {
                    (
                        column.as_str(),
                        canonical.get(column).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect();

            let entity = match self.registry.fetch_one(db, &query)? {
                Some(existing) => existing,
                None => Rc::new(RefCell::new(self.registry.mapper().new_entity())),
            };

            // An existing entity keeps its assigned key even when the
            // import row carries a different one.
            let assigned = self.registry.mapper().id_of(&entity.borrow());
            if assigned > 0 {
                canonical.set(ID_COLUMN, Value::Integer(assigned));
            }

            hooks.prepare_row(&mut canonical);
            self.registry
                .mapper()
                .from_row(&mut entity.borrow_mut(), &canonical);
            hooks.before_save(&entity, &canonical);
            self.registry.save(db, &entity)?;
            hooks.after_save(&entity, &canonical);
        }
        tracing::debug!(
            "imported {} rows into {}",
            rows.len(),
            self.registry.table()
        );
        Ok(())
    }

    /// Import rows located inside a nested structure by a `/`-delimited
    /// selector path ("tables/data" selects `set["tables"]["data"]`, which
    /// must be a list of row objects).
    pub fn import_set(
        &mut self,
        db: &dyn Database,
        set: &serde_json::Value,
        selector: &str,
    ) -> Result<()> {
        self.import_set_with(db, set, selector, &mut NoHooks)
    }

    /// Selector-based import with hooks
    pub fn import_set_with(
        &mut self,
        db: &dyn Database,
        set: &serde_json::Value,
        selector: &str,
        hooks: &mut dyn ImportHooks<M>,
    ) -> Result<()> {
        let rows = select_rows(set, selector)?;
        self.import_rows_with(db, &rows, hooks)
    }

    /// Parse JSON from a reader and import the rows under the selector
    pub fn import_json(
        &mut self,
        db: &dyn Database,
        reader: impl std::io::Read,
        selector: &str,
    ) -> Result<()> {
        let set: serde_json::Value = serde_json::from_reader(reader)?;
        self.import_set(db, &set, selector)
    }
}

/// Descend a nested JSON structure along a `/`-delimited path, expecting a
/// list of row objects at the terminal segment.
fn select_rows(set: &serde_json::Value, selector: &str) -> Result<Vec<Record>> {
    let segments: Vec<&str> = selector.split('/').collect();
    let last = segments.len() - 1;
    let mut current = set;
    for (i, segment) in segments.iter().enumerate() {
        let Some(object) = current.as_object() else {
            return Err(Error::Selector(format!("cannot descend into {}", segment)));
        };
        let Some(next) = object.get(*segment) else {
            return Err(Error::Selector(format!("cannot find {}", segment)));
        };
        if i == last {
            let Some(items) = next.as_array() else {
                return Err(Error::Selector(format!("{} is not a list of rows", segment)));
            };
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                let Some(fields) = item.as_object() else {
                    return Err(Error::Selector("row elements must be objects".into()));
                };
                rows.push(Record::from_json_object(fields));
            }
            return Ok(rows);
        }
        if !next.is_object() {
            return Err(Error::Selector(format!("{} is not a map", segment)));
        }
        current = next;
    }
    Err(Error::Selector("empty selector".into()))
}
