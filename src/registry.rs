//! Entity registry - per-table identity map over a datastore
//!
//! The registry guarantees that at most one live object represents a given
//! row at any time. Entities are handled through [`Shared`] handles
//! (`Rc<RefCell<T>>`); the cache holds only weak observations, so an entity
//! dies exactly when the last caller-held handle is dropped, and its cache
//! entry is evicted lazily on the next lookup that touches it.
//!
//! Dirty state lives in the cache entry, not the entity: a set of mutated
//! column names (reported through [`EntityRegistry::touch`]) plus a whole-
//! record flag for entity types without field-level tracking.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use crate::db::{Cursor, Database};
use crate::mapper::RecordMapper;
use crate::row::Record;
use crate::schema::{SchemaCatalog, TableSchema};
use crate::statement::{ID_COLUMN, StatementBuilder};
use crate::value::Value;
use crate::{Error, Result};

/// Shared handle to a live entity
pub type Shared<T> = Rc<RefCell<T>>;

/// Cache slot for one primary key.
struct CacheEntry<T> {
    entity: Weak<RefCell<T>>,
    dirty: BTreeSet<String>,
    dirty_flag: bool,
}

impl<T> CacheEntry<T> {
    fn new(entity: &Shared<T>) -> Self {
        Self {
            entity: Rc::downgrade(entity),
            dirty: BTreeSet::new(),
            dirty_flag: false,
        }
    }

    fn live(&self) -> Option<Shared<T>> {
        self.entity.upgrade()
    }
}

/// Identity-mapped data access for one table.
///
/// Not safe for concurrent mutation; the handle types are deliberately
/// single-threaded. Callers needing parallelism keep one registry per
/// worker.
pub struct EntityRegistry<M: RecordMapper> {
    table: String,
    schema: TableSchema,
    mapper: M,
    cache: HashMap<i64, CacheEntry<M::Entity>>,
}

impl<M: RecordMapper> EntityRegistry<M> {
    /// Create a registry from an already-discovered schema
    pub fn new(table: impl Into<String>, schema: TableSchema, mapper: M) -> Self {
        Self {
            table: table.into(),
            schema,
            mapper,
            cache: HashMap::new(),
        }
    }

    /// Create a registry for a table, discovering its schema through the
    /// catalog (running pending migrations first).
    pub fn open(
        db: &dyn Database,
        catalog: &mut SchemaCatalog,
        table: &str,
        mapper: M,
    ) -> Result<Self> {
        let schema = catalog.table_schema(db, table)?.clone();
        Ok(Self::new(table, schema, mapper))
    }

    /// The table this registry maps
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The column metadata this registry was built with
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The mapper in use
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    fn builder(&self) -> StatementBuilder<'_> {
        StatementBuilder::new(&self.table, &self.schema)
    }

    /// Read the cursor's current row into a [`Record`], keeping only
    /// columns known to the schema and coercing each value to its declared
    /// type. The primary key is always widened to a 64-bit integer.
    fn read_row(&self, cursor: &dyn Cursor) -> Result<Record> {
        let mut row = Record::new();
        for idx in 0..cursor.column_count() {
            let Some(name) = cursor.column_name(idx) else {
                continue;
            };
            let Some(col_type) = self.schema.column_type(name) else {
                continue;
            };
            let name = name.to_string();
            let value = cursor.get(idx)?;
            if name == ID_COLUMN {
                row.set(name, Value::Integer(value.as_i64()));
            } else {
                row.set(name, value.coerce(col_type));
            }
        }
        Ok(row)
    }

    fn bind_args(&self, row: &Record, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Construct a new entity from a row and cache it clean under `id`.
    fn admit(&mut self, id: i64, row: &Record) -> Shared<M::Entity> {
        let mut entity = self.mapper.new_entity();
        self.mapper.from_row(&mut entity, row);
        let entity = Rc::new(RefCell::new(entity));
        self.cache.insert(id, CacheEntry::new(&entity));
        entity
    }

    /// Return the live cached entity for a key, evicting the entry if its
    /// referent has been dropped.
    pub fn get_cached(&mut self, id: i64) -> Option<Shared<M::Entity>> {
        match self.cache.get(&id) {
            None => None,
            Some(entry) => match entry.live() {
                Some(entity) => Some(entity),
                None => {
                    tracing::debug!("evicting decayed entity {} from {}", id, self.table);
                    self.cache.remove(&id);
                    None
                }
            },
        }
    }

    /// Get an entity by primary key.
    ///
    /// With `refresh` false this is a cache read: a key this registry has
    /// never seen returns `None` without touching the datastore, while a
    /// decayed entry is evicted and falls through to a fetch. With
    /// `refresh` true the row is always re-fetched, updating the cached
    /// object in place if one is live. A fetch matching no row is `None`.
    pub fn get_by_id(
        &mut self,
        db: &dyn Database,
        id: i64,
        refresh: bool,
    ) -> Result<Option<Shared<M::Entity>>> {
        if !refresh {
            match self.cache.get(&id) {
                None => return Ok(None),
                Some(entry) => {
                    if let Some(entity) = entry.live() {
                        return Ok(Some(entity));
                    }
                    tracing::debug!("evicting decayed entity {} from {}", id, self.table);
                    self.cache.remove(&id);
                }
            }
        }
        let sql = self.builder().select_by_id();
        let mut cursor = db.query(&sql, &[Value::Integer(id)])?;
        if !cursor.advance()? {
            return Ok(None);
        }
        let row = self.read_row(cursor.as_ref())?;
        match self.get_cached(id) {
            Some(entity) => {
                self.mapper.from_row(&mut entity.borrow_mut(), &row);
                Ok(Some(entity))
            }
            None => Ok(Some(self.admit(id, &row))),
        }
    }

    /// Every currently live cached entity, evicting decayed entries as a
    /// side effect.
    ///
    /// Not a reliable enumeration: membership depends on callers holding
    /// handles elsewhere. Use [`EntityRegistry::fetch_all`] to enumerate
    /// the table itself.
    pub fn get_all_cached(&mut self) -> Vec<Shared<M::Entity>> {
        let mut live = Vec::new();
        let mut dead = Vec::new();
        for (id, entry) in &self.cache {
            match entry.live() {
                Some(entity) => live.push(entity),
                None => dead.push(*id),
            }
        }
        for id in dead {
            tracing::debug!("evicting decayed entity {} from {}", id, self.table);
            self.cache.remove(&id);
        }
        live
    }

    /// Fetch every row of the table
    pub fn fetch_all(&mut self, db: &dyn Database) -> Result<Vec<Shared<M::Entity>>> {
        let sql = self.builder().select_all();
        self.fetch_query(db, &sql, &[])
    }

    /// Fetch rows matching AND-joined column equality predicates
    pub fn fetch_where(
        &mut self,
        db: &dyn Database,
        query: &[(&str, Value)],
    ) -> Result<Vec<Shared<M::Entity>>> {
        let columns: Vec<&str> = query.iter().map(|(column, _)| *column).collect();
        let params: Vec<Value> = query.iter().map(|(_, value)| value.clone()).collect();
        let sql = self.builder().select_where(&columns);
        self.fetch_query(db, &sql, &params)
    }

    /// Fetch the first row matching the predicates, if any
    pub fn fetch_one(
        &mut self,
        db: &dyn Database,
        query: &[(&str, Value)],
    ) -> Result<Option<Shared<M::Entity>>> {
        Ok(self.fetch_where(db, query)?.into_iter().next())
    }

    /// Run a SELECT and reconcile every row into the cache: a row whose key
    /// is already live refreshes the existing object in place (every holder
    /// of that handle observes the fetched values); any other row becomes a
    /// newly admitted entity. Prefer wrapping this in purpose-built finder
    /// methods over exposing SQL to callers.
    pub fn fetch_query(
        &mut self,
        db: &dyn Database,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Shared<M::Entity>>> {
        let mut cursor = db.query(sql, params)?;
        let mut out = Vec::new();
        while cursor.advance()? {
            let row = self.read_row(cursor.as_ref())?;
            let id = row.get(ID_COLUMN).map(|value| value.as_i64()).unwrap_or(0);
            let entity = match self.get_cached(id) {
                Some(entity) => {
                    self.mapper.from_row(&mut entity.borrow_mut(), &row);
                    entity
                }
                None => self.admit(id, &row),
            };
            out.push(entity);
        }
        Ok(out)
    }

    /// Insert an entity. Fails with [`Error::DuplicateKey`] when its key is
    /// already live in the cache. On success the datastore-assigned key is
    /// written back into the entity and the entity is cached clean.
    pub fn insert(&mut self, db: &dyn Database, entity: &Shared<M::Entity>) -> Result<()> {
        let id = self.mapper.id_of(&entity.borrow());
        if self.get_cached(id).is_some() {
            return Err(Error::DuplicateKey(id));
        }

        let mut row = self.mapper.to_row(&entity.borrow());
        let (sql, columns) = self.builder().insert(&row);
        let args = self.bind_args(&row, &columns);
        db.execute(&sql, &args)?;

        let mut cursor = db.query("select last_insert_rowid()", &[])?;
        if !cursor.advance()? {
            return Err(Error::Statement("failed to read the insert id".into()));
        }
        let assigned = cursor.get(0)?.as_i64();
        row.set(ID_COLUMN, Value::Integer(assigned));
        self.mapper.from_row(&mut entity.borrow_mut(), &row);
        self.cache.insert(assigned, CacheEntry::new(entity));
        Ok(())
    }

    /// Update an entity's row. Fails with [`Error::NotLoaded`] when its key
    /// is not live in the cache (load or insert first). Field-tracking
    /// mappers write only the recorded dirty columns; an empty dirty set is
    /// a caller error. Clears dirty state on success.
    pub fn update(&mut self, db: &dyn Database, entity: &Shared<M::Entity>) -> Result<()> {
        let id = self.mapper.id_of(&entity.borrow());
        if self.get_cached(id).is_none() {
            return Err(Error::NotLoaded(id));
        }
        self.write_update(db, entity, id, false)
    }

    fn write_update(
        &mut self,
        db: &dyn Database,
        entity: &Shared<M::Entity>,
        id: i64,
        force_full: bool,
    ) -> Result<()> {
        let row = self.mapper.to_row(&entity.borrow());
        let (sql, columns) = if self.mapper.tracks_fields() && !force_full {
            let entry = self.cache.get(&id).ok_or(Error::NotLoaded(id))?;
            self.builder().update_dirty(&entry.dirty)?
        } else {
            self.builder().update_all()
        };
        let mut args = self.bind_args(&row, &columns);
        args.push(Value::Integer(id));
        db.execute(&sql, &args)?;

        if let Some(entry) = self.cache.get_mut(&id) {
            entry.dirty.clear();
            entry.dirty_flag = false;
        }
        Ok(())
    }

    /// Save an entity: an idempotent upsert. A live-cached key updates; an
    /// uncached key is probed in the datastore by a refreshing load, then
    /// updated (registering the given entity as the live object for that
    /// key) or inserted. A freshly registered entity carries no dirty
    /// fields, so that update writes the full row.
    pub fn save(&mut self, db: &dyn Database, entity: &Shared<M::Entity>) -> Result<()> {
        let id = self.mapper.id_of(&entity.borrow());
        if self.get_cached(id).is_some() {
            return self.update(db, entity);
        }

        let exists = if id > 0 {
            let sql = self.builder().select_by_id();
            let mut cursor = db.query(&sql, &[Value::Integer(id)])?;
            cursor.advance()?
        } else {
            false
        };

        if exists {
            self.cache.insert(id, CacheEntry::new(entity));
            self.write_update(db, entity, id, true)
        } else {
            self.insert(db, entity)
        }
    }

    /// Whether an entity needs saving: true when it was never cached (never
    /// persisted) or when its dirty flag or recorded dirty fields say so.
    pub fn is_dirty(&mut self, entity: &Shared<M::Entity>) -> bool {
        let id = self.mapper.id_of(&entity.borrow());
        if self.get_cached(id).is_none() {
            return true;
        }
        match self.cache.get(&id) {
            Some(entry) => {
                if self.mapper.tracks_fields() {
                    entry.dirty_flag || !entry.dirty.is_empty()
                } else {
                    entry.dirty_flag
                }
            }
            None => true,
        }
    }

    /// Set or clear the whole-record dirty flag. Clearing also clears the
    /// recorded dirty fields. No-op for entities without an assigned key.
    pub fn set_dirty(&mut self, entity: &Shared<M::Entity>, dirty: bool) {
        let id = self.mapper.id_of(&entity.borrow());
        if id <= 0 {
            return;
        }
        if let Some(entry) = self.cache.get_mut(&id) {
            entry.dirty_flag = dirty;
            if !dirty {
                entry.dirty.clear();
            }
        }
    }

    /// Record a field mutation for a cached entity, so the next update
    /// writes that column. Columns unknown to the schema are ignored, as
    /// are entities that are not cached.
    pub fn touch(&mut self, entity: &Shared<M::Entity>, column: &str) {
        let id = self.mapper.id_of(&entity.borrow());
        if !self.schema.contains(column) {
            return;
        }
        if let Some(entry) = self.cache.get_mut(&id) {
            entry.dirty.insert(column.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDb;
    use crate::mapper::RecordRowMapper;

    const SCRIPT: &str = "--version:1\n\
        CREATE TABLE widget (id INTEGER PRIMARY KEY, name TEXT, price REAL);\n\
        --\n";

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Widget {
        id: i64,
        name: String,
        price: f64,
    }

    /// Field-tracking mapper for the Widget fixture.
    struct WidgetMapper;

    impl RecordMapper for WidgetMapper {
        type Entity = Widget;

        fn new_entity(&self) -> Widget {
            Widget::default()
        }

        fn to_row(&self, widget: &Widget) -> Record {
            [
                ("id", Value::Integer(widget.id)),
                ("name", Value::Text(widget.name.clone())),
                ("price", Value::Real(widget.price)),
            ]
            .into_iter()
            .collect()
        }

        fn from_row(&self, widget: &mut Widget, row: &Record) {
            if let Some(value) = row.get("id") {
                widget.id = value.as_i64();
            }
            if let Some(value) = row.get("name") {
                widget.name = value.as_text();
            }
            if let Some(value) = row.get("price") {
                widget.price = value.as_f64();
            }
        }

        fn id_of(&self, widget: &Widget) -> i64 {
            widget.id
        }

        fn tracks_fields(&self) -> bool {
            true
        }
    }

    fn setup() -> (SqliteDb, EntityRegistry<WidgetMapper>) {
        let db = SqliteDb::open_in_memory().unwrap();
        let mut catalog = SchemaCatalog::new(SCRIPT, 1);
        let registry = EntityRegistry::open(&db, &mut catalog, "widget", WidgetMapper).unwrap();
        (db, registry)
    }

    fn sample(name: &str, price: f64) -> Shared<Widget> {
        Rc::new(RefCell::new(Widget {
            id: 0,
            name: name.into(),
            price,
        }))
    }

    fn db_name(db: &SqliteDb, id: i64) -> Option<String> {
        let mut cursor = db
            .query("SELECT name FROM widget WHERE id=?", &[Value::Integer(id)])
            .unwrap();
        if cursor.advance().unwrap() {
            Some(cursor.get(0).unwrap().as_text())
        } else {
            None
        }
    }

    #[test]
    fn test_insert_assigns_key_and_caches_clean() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();

        let id = widget.borrow().id;
        assert!(id > 0);
        assert!(!registry.is_dirty(&widget));
        assert_eq!(db_name(&db, id).as_deref(), Some("anvil"));
    }

    #[test]
    fn test_get_by_id_returns_the_same_instance() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        let id = widget.borrow().id;

        let first = registry.get_by_id(&db, id, false).unwrap().unwrap();
        let second = registry.get_by_id(&db, id, false).unwrap().unwrap();
        assert!(Rc::ptr_eq(&widget, &first));
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unseen_key_is_a_cache_miss_without_refresh() {
        let (db, mut registry) = setup();
        db.execute(
            "INSERT INTO widget (id, name, price) VALUES (5, 'ghost', 1.0)",
            &[],
        )
        .unwrap();

        // Cache-only read does not consult the datastore.
        assert!(registry.get_by_id(&db, 5, false).unwrap().is_none());
        // A refreshing read fetches and admits it.
        let fetched = registry.get_by_id(&db, 5, true).unwrap().unwrap();
        assert_eq!(fetched.borrow().name, "ghost");
        // Now cached.
        assert!(registry.get_by_id(&db, 5, false).unwrap().is_some());
    }

    #[test]
    fn test_dropped_entity_is_evicted_and_refetched() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        let id = widget.borrow().id;

        assert!(registry.get_cached(id).is_some());
        drop(widget);

        // The entry decayed with the last strong handle.
        assert!(registry.get_cached(id).is_none());
        // A plain lookup now falls through to a fresh fetch.
        let refetched = registry.get_by_id(&db, id, false).unwrap();
        assert!(refetched.is_none());

        // Re-insert and exercise the decayed-entry path of get_by_id.
        let widget = sample("hammer", 3.0);
        registry.insert(&db, &widget).unwrap();
        let id = widget.borrow().id;
        drop(widget);
        let reloaded = registry.get_by_id(&db, id, false).unwrap().unwrap();
        assert_eq!(reloaded.borrow().name, "hammer");
    }

    #[test]
    fn test_fetch_all_refreshes_live_objects_in_place() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        let id = widget.borrow().id;

        // Another writer changes the row behind our back.
        db.execute(
            "UPDATE widget SET name='renamed' WHERE id=?",
            &[Value::Integer(id)],
        )
        .unwrap();

        let all = registry.fetch_all(&db).unwrap();
        assert_eq!(all.len(), 1);
        assert!(Rc::ptr_eq(&all[0], &widget));
        // Every holder of the handle observes the fetched values.
        assert_eq!(widget.borrow().name, "renamed");
    }

    #[test]
    fn test_duplicate_insert_and_stale_update_fail() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        let err = registry.insert(&db, &widget).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        let stray = Rc::new(RefCell::new(Widget {
            id: 999,
            name: "stray".into(),
            price: 0.0,
        }));
        let err = registry.update(&db, &stray).unwrap_err();
        assert!(matches!(err, Error::NotLoaded(999)));
    }

    #[test]
    fn test_update_writes_only_touched_fields() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        let id = widget.borrow().id;

        widget.borrow_mut().name = "renamed".into();
        widget.borrow_mut().price = 100.0;
        registry.touch(&widget, "name");
        registry.update(&db, &widget).unwrap();

        assert_eq!(db_name(&db, id).as_deref(), Some("renamed"));
        // price was never touched, so its change was not written...
        let reloaded = registry.get_by_id(&db, id, true).unwrap().unwrap();
        assert!(Rc::ptr_eq(&reloaded, &widget));
        // ...and the refreshing load reverts it in the live object.
        assert_eq!(widget.borrow().price, 9.5);
    }

    #[test]
    fn test_update_with_no_dirty_fields_is_a_caller_error() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        let err = registry.update(&db, &widget).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_save_degrades_to_insert_or_update() {
        let (db, mut registry) = setup();

        // Unknown entity: save inserts.
        let widget = sample("anvil", 9.5);
        registry.save(&db, &widget).unwrap();
        let id = widget.borrow().id;
        assert!(id > 0);

        // Cached entity: save updates.
        widget.borrow_mut().name = "renamed".into();
        registry.touch(&widget, "name");
        registry.save(&db, &widget).unwrap();
        assert_eq!(db_name(&db, id).as_deref(), Some("renamed"));

        // Uncached entity whose row exists: a fresh registry saves by
        // updating, not by inserting a duplicate.
        let mut catalog = SchemaCatalog::new(SCRIPT, 1);
        let mut fresh = EntityRegistry::open(&db, &mut catalog, "widget", WidgetMapper).unwrap();
        let detached = Rc::new(RefCell::new(Widget {
            id,
            name: "imported".into(),
            price: 2.0,
        }));
        fresh.save(&db, &detached).unwrap();
        assert_eq!(db_name(&db, id).as_deref(), Some("imported"));

        let mut cursor = db.query("SELECT count(*) FROM widget", &[]).unwrap();
        cursor.advance().unwrap();
        assert_eq!(cursor.get(0).unwrap().as_i64(), 1);
    }

    #[test]
    fn test_dirty_flag_lifecycle() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);

        // Never persisted counts as dirty.
        assert!(registry.is_dirty(&widget));

        registry.insert(&db, &widget).unwrap();
        assert!(!registry.is_dirty(&widget));

        registry.touch(&widget, "name");
        assert!(registry.is_dirty(&widget));

        // Clearing the flag also clears recorded fields.
        registry.set_dirty(&widget, false);
        assert!(!registry.is_dirty(&widget));

        registry.set_dirty(&widget, true);
        assert!(registry.is_dirty(&widget));

        // Entities without an assigned key are not flaggable.
        let unsaved = sample("loose", 0.0);
        registry.set_dirty(&unsaved, true);
        assert!(registry.is_dirty(&unsaved));
    }

    #[test]
    fn test_touch_ignores_unknown_columns() {
        let (db, mut registry) = setup();
        let widget = sample("anvil", 9.5);
        registry.insert(&db, &widget).unwrap();
        registry.touch(&widget, "no_such_column");
        assert!(!registry.is_dirty(&widget));
    }

    #[test]
    fn test_fetch_where_equality() {
        let (db, mut registry) = setup();
        registry.insert(&db, &sample("anvil", 9.5)).unwrap();
        let hammer = sample("hammer", 3.0);
        registry.insert(&db, &hammer).unwrap();

        let found = registry
            .fetch_where(&db, &[("name", Value::from("hammer"))])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(Rc::ptr_eq(&found[0], &hammer));

        let none = registry
            .fetch_one(&db, &[("name", Value::from("wrench"))])
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_get_all_cached_reports_only_live_entities() {
        let (db, mut registry) = setup();
        let kept = sample("kept", 1.0);
        registry.insert(&db, &kept).unwrap();
        let dropped = sample("dropped", 2.0);
        registry.insert(&db, &dropped).unwrap();
        drop(dropped);

        let cached = registry.get_all_cached();
        assert_eq!(cached.len(), 1);
        assert!(Rc::ptr_eq(&cached[0], &kept));
    }

    #[test]
    fn test_generic_record_registry_round_trip() {
        let db = SqliteDb::open_in_memory().unwrap();
        let mut catalog = SchemaCatalog::new(SCRIPT, 1);
        let mut registry =
            EntityRegistry::open(&db, &mut catalog, "widget", RecordRowMapper).unwrap();

        let record: Record = [
            ("name", Value::Text("anvil".into())),
            ("price", Value::Real(9.5)),
        ]
        .into_iter()
        .collect();
        let entity = Rc::new(RefCell::new(record));
        registry.insert(&db, &entity).unwrap();
        let id = entity.borrow().get("id").unwrap().as_i64();
        assert!(id > 0);

        let reloaded = registry.get_by_id(&db, id, true).unwrap().unwrap();
        assert!(Rc::ptr_eq(&reloaded, &entity));
        assert_eq!(
            entity.borrow().get("name"),
            Some(&Value::Text("anvil".into()))
        );
        assert_eq!(entity.borrow().get("price"), Some(&Value::Real(9.5)));
    }
}
