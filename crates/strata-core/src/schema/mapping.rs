mod entity;
pub use entity::EntityMapping;

mod fragment;
pub use fragment::{Fragment, PropertyMapping};

use super::app::EntityTypeId;
use indexmap::IndexMap;

/// Defines the correspondence between entity types and the store objects
/// holding their data.
///
/// Built during projection and immutable afterwards. Entity types that are
/// not mapped anywhere (abstract TPC types, unmapped types) have an entry
/// with no fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    /// Per entity type mappings, in canonical order.
    pub entity_types: IndexMap<EntityTypeId, EntityMapping>,
}

impl Mapping {
    /// Returns the mapping for the specified entity type.
    ///
    /// # Panics
    ///
    /// Panics if the entity type ID does not exist in the mapping.
    pub fn entity_type(&self, id: impl Into<EntityTypeId>) -> &EntityMapping {
        self.entity_types
            .get(&id.into())
            .expect("invalid entity type ID")
    }

    pub(crate) fn entity_type_mut(&mut self, id: EntityTypeId) -> &mut EntityMapping {
        self.entity_types
            .entry(id)
            .or_insert_with(|| EntityMapping::new(id))
    }
}
