use super::{EntityType, EntityTypeId, Key, MappingStrategy, Property, PropertyId, Sequence};
use crate::schema::{Annotations, ObjectName};

use indexmap::IndexMap;

/// A finalized, validated conceptual model.
///
/// Built by [`ModelBuilder::finalize`](super::ModelBuilder::finalize) and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub entity_types: IndexMap<EntityTypeId, EntityType>,

    pub sequences: Vec<Sequence>,

    /// Schema for store objects that do not name one
    pub default_schema: Option<String>,

    /// Version of the tool that produced the model, when read from a snapshot
    pub product_version: Option<String>,

    pub annotations: Annotations,
}

impl Model {
    /// Get an entity type by ID
    pub fn entity_type(&self, id: impl Into<EntityTypeId>) -> &EntityType {
        self.entity_types
            .get(&id.into())
            .expect("invalid entity type ID")
    }

    pub fn entity_types(&self) -> impl ExactSizeIterator<Item = &EntityType> {
        self.entity_types.values()
    }

    pub fn find_entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_types.values().find(|e| e.name == name)
    }

    /// Get a property by ID
    pub fn property(&self, id: PropertyId) -> &Property {
        self.entity_type(id.entity).property(id)
    }

    pub fn find_sequence(&self, name: &ObjectName) -> Option<&Sequence> {
        self.sequences.iter().find(|s| &s.name == name)
    }

    /// Root of the inheritance tree `id` belongs to
    pub fn root_of(&self, id: EntityTypeId) -> &EntityType {
        let mut entity = self.entity_type(id);
        while let Some(base) = entity.base {
            entity = self.entity_type(base);
        }
        entity
    }

    /// Effective mapping strategy, inherited from the root.
    pub fn strategy_of(&self, id: EntityTypeId) -> MappingStrategy {
        self.root_of(id).strategy.unwrap_or_default()
    }

    /// `true` when the type is part of a hierarchy with more than one type.
    pub fn in_hierarchy(&self, id: EntityTypeId) -> bool {
        let entity = self.entity_type(id);
        entity.base.is_some() || !entity.derived.is_empty()
    }

    /// The chain of types from the root down to `id`, inclusive.
    pub fn ancestry(&self, id: EntityTypeId) -> Vec<&EntityType> {
        let mut chain = vec![self.entity_type(id)];
        while let Some(base) = chain[chain.len() - 1].base {
            chain.push(self.entity_type(base));
        }
        chain.reverse();
        chain
    }

    /// `id` and every type derived from it, preorder with siblings sorted by
    /// name.
    pub fn descendants(&self, id: EntityTypeId) -> Vec<&EntityType> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let entity = self.entity_type(id);
            out.push(entity);
            stack.extend(entity.derived.iter().rev().copied());
        }
        out
    }

    /// Depth in the inheritance tree; roots are at 0.
    pub fn depth_of(&self, id: EntityTypeId) -> usize {
        self.ancestry(id).len() - 1
    }

    /// Primary key, declared on the root of the hierarchy.
    pub fn primary_key_of(&self, id: EntityTypeId) -> Option<&Key> {
        self.root_of(id).primary_key.as_ref()
    }

    /// Properties visible on `id`: inherited ones first, root-most first.
    pub fn properties_of(&self, id: EntityTypeId) -> impl Iterator<Item = &Property> {
        self.ancestry(id)
            .into_iter()
            .flat_map(|entity| entity.properties.iter())
    }

    /// Finds a property visible on `id` by name, searching base types.
    pub fn find_property(&self, id: EntityTypeId, name: &str) -> Option<&Property> {
        self.properties_of(id).find(|p| p.name == name)
    }

    /// `true` when the type is stored inside a JSON column of an owner.
    pub fn in_json(&self, id: EntityTypeId) -> bool {
        let mut entity = self.entity_type(id);
        while let Some(ownership) = &entity.ownership {
            if ownership.json {
                return true;
            }
            entity = self.entity_type(ownership.owner);
        }
        false
    }

    /// Owned types whose owner is `id`, sorted by navigation.
    pub fn owned_by(&self, id: EntityTypeId) -> Vec<&EntityType> {
        let mut owned: Vec<_> = self
            .entity_types()
            .filter(|e| e.ownership.as_ref().is_some_and(|o| o.owner == id))
            .collect();
        owned.sort_by(|a, b| a.name.cmp(&b.name));
        owned
    }

    /// All entity types in an order independent of declaration order: roots
    /// sorted by name, each followed by the types it owns and then by its
    /// derived types.
    pub fn canonical_order(&self) -> Vec<EntityTypeId> {
        let mut roots: Vec<_> = self
            .entity_types()
            .filter(|e| e.base.is_none() && e.ownership.is_none())
            .collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = Vec::with_capacity(self.entity_types.len());
        for root in roots {
            self.visit_canonical(root.id, &mut out);
        }
        out
    }

    fn visit_canonical(&self, id: EntityTypeId, out: &mut Vec<EntityTypeId>) {
        out.push(id);
        for owned in self.owned_by(id) {
            self.visit_canonical(owned.id, out);
        }
        for derived in &self.entity_type(id).derived {
            self.visit_canonical(*derived, out);
        }
    }

    /// Effective schema for an object name.
    pub fn qualify(&self, name: &ObjectName) -> ObjectName {
        name.or_schema(self.default_schema.as_deref())
    }
}
