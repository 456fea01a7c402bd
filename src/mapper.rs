//! Record mappers - the polymorphic seam between rows and domain objects
//!
//! A [`RecordMapper`] knows how to build a blank entity, copy row values
//! into it, serialize it back to a row, and extract its primary key. The
//! registry and importer are generic over this trait; [`RecordRowMapper`]
//! is the ready-made implementation for schemaless use, where the entity
//! *is* a [`Record`].

use crate::row::Record;
use crate::statement::ID_COLUMN;

/// Maps between one entity type and its row representation.
pub trait RecordMapper {
    /// The domain object type this mapper handles
    type Entity;

    /// Construct a blank entity
    fn new_entity(&self) -> Self::Entity;

    /// Serialize an entity's fields into a row
    fn to_row(&self, entity: &Self::Entity) -> Record;

    /// Copy row values into an entity, overwriting matching fields
    fn from_row(&self, entity: &mut Self::Entity, row: &Record);

    /// Extract the primary key; values ≤ 0 mean "not yet persisted"
    fn id_of(&self, entity: &Self::Entity) -> i64;

    /// Whether entities of this type report field-level mutations (via
    /// [`EntityRegistry::touch`](crate::registry::EntityRegistry::touch)).
    /// Field-tracking entities get minimal dirty-column updates; others
    /// fall back to full-row updates.
    fn tracks_fields(&self) -> bool {
        false
    }
}

/// Generic mapper whose entity is an untyped [`Record`].
///
/// Cache identity for record entities is the shared handle itself, never
/// the record's contents, so two records with equal values remain distinct
/// entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordRowMapper;

impl RecordMapper for RecordRowMapper {
    type Entity = Record;

    fn new_entity(&self) -> Record {
        Record::new()
    }

    fn to_row(&self, entity: &Record) -> Record {
        entity.clone()
    }

    fn from_row(&self, entity: &mut Record, row: &Record) {
        entity.merge(row);
    }

    fn id_of(&self, entity: &Record) -> i64 {
        entity.get(ID_COLUMN).map(|v| v.as_i64()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_record_mapper_round_trip() {
        let mapper = RecordRowMapper;
        let original: Record = [
            ("id", Value::Integer(4)),
            ("name", Value::Text("anvil".into())),
            ("price", Value::Real(9.5)),
        ]
        .into_iter()
        .collect();

        let row = mapper.to_row(&original);
        let mut rebuilt = mapper.new_entity();
        mapper.from_row(&mut rebuilt, &row);
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_id_extraction_with_coercion() {
        let mapper = RecordRowMapper;
        let by_int: Record = [("id", Value::Integer(9))].into_iter().collect();
        assert_eq!(mapper.id_of(&by_int), 9);

        // Import payloads routinely carry keys as text.
        let by_text: Record = [("id", Value::Text("12".into()))].into_iter().collect();
        assert_eq!(mapper.id_of(&by_text), 12);

        assert_eq!(mapper.id_of(&Record::new()), 0);
    }

    #[test]
    fn test_from_row_preserves_unmentioned_fields() {
        let mapper = RecordRowMapper;
        let mut entity: Record = [("id", Value::Integer(1)), ("name", Value::Text("a".into()))]
            .into_iter()
            .collect();
        let partial: Record = [("name", Value::Text("b".into()))].into_iter().collect();
        mapper.from_row(&mut entity, &partial);
        assert_eq!(entity.get("id"), Some(&Value::Integer(1)));
        assert_eq!(entity.get("name"), Some(&Value::Text("b".into())));
    }
}
