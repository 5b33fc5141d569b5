use super::{
    CheckConstraint, ComplexProperty, ForeignKey, FunctionMapping, Index, Key, Property,
    PropertyId, SeedRow, SkipNavigation, SplitFragment, StoredProcedureMapping, Trigger,
    ViewMapping,
};
use crate::schema::{Annotations, ObjectName, Value};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    /// Uniquely identifies the entity type in the model
    pub id: EntityTypeId,

    /// Name of the entity type. Owned types are named `{Owner}.{Navigation}`.
    pub name: String,

    /// Base type in the inheritance tree
    pub base: Option<EntityTypeId>,

    /// Directly derived types, sorted by name
    pub derived: Vec<EntityTypeId>,

    pub is_abstract: bool,

    /// Mapping strategy as declared. Only roots declare one; the effective
    /// strategy of every type is its root's.
    pub strategy: Option<MappingStrategy>,

    /// Properties declared on this type, not including inherited ones
    pub properties: Vec<Property>,

    pub complex_properties: Vec<ComplexProperty>,

    /// Declared on roots only
    pub primary_key: Option<Key>,

    /// Declared with `has_no_key`
    pub keyless: bool,

    pub alternate_keys: Vec<Key>,

    pub indexes: Vec<Index>,

    /// Relationships in which this type is the dependent
    pub foreign_keys: Vec<ForeignKey>,

    pub skip_navigations: Vec<SkipNavigation>,

    pub ownership: Option<Ownership>,

    pub table: TableMapping,

    /// The main table is left alone by migrations
    pub excluded_from_migrations: bool,

    pub view: Option<ViewMapping>,

    pub function: Option<FunctionMapping>,

    pub procedures: Vec<StoredProcedureMapping>,

    pub fragments: Vec<SplitFragment>,

    /// Discriminator property, on TPH roots
    pub discriminator: Option<PropertyId>,

    pub discriminator_value: Option<Value>,

    pub check_constraints: Vec<CheckConstraint>,

    pub triggers: Vec<Trigger>,

    pub comment: Option<String>,

    pub annotations: Annotations,

    /// Seed rows, in declaration order
    pub data: Vec<SeedRow>,
}

/// Uniquely identifies an entity type
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityTypeId(pub usize);

/// How an inheritance hierarchy is spread over tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MappingStrategy {
    /// Table per hierarchy
    #[default]
    Tph,

    /// Table per type
    Tpt,

    /// Table per concrete type
    Tpc,
}

/// Table an entity type's main fragment maps to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableMapping {
    /// Table named by convention
    #[default]
    Default,

    Table(ObjectName),

    /// Not mapped to a table
    None,
}

/// Binds an owned type to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: EntityTypeId,

    /// Navigation on the owner
    pub navigation: String,

    /// Owned collection rather than owned reference
    pub collection: bool,

    /// The owner always has a dependent
    pub required: bool,

    /// The owned graph rooted here is stored in a single JSON column
    pub json: bool,

    /// JSON column name; the navigation name when `None`
    pub json_column: Option<String>,
}

impl EntityType {
    pub fn new(id: EntityTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            base: None,
            derived: vec![],
            is_abstract: false,
            strategy: None,
            properties: vec![],
            complex_properties: vec![],
            primary_key: None,
            keyless: false,
            alternate_keys: vec![],
            indexes: vec![],
            foreign_keys: vec![],
            skip_navigations: vec![],
            ownership: None,
            table: TableMapping::Default,
            excluded_from_migrations: false,
            view: None,
            function: None,
            procedures: vec![],
            fragments: vec![],
            discriminator: None,
            discriminator_value: None,
            check_constraints: vec![],
            triggers: vec![],
            comment: None,
            annotations: Annotations::new(),
            data: vec![],
        }
    }

    /// The last segment of the name: `Address` for `Order.Address`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_owned(&self) -> bool {
        self.ownership.is_some()
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        assert_eq!(id.entity, self.id, "property {id:?} belongs to another entity type");
        self.properties.get(id.index).expect("invalid property ID")
    }

    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl EntityTypeId {
    pub(crate) fn placeholder() -> Self {
        Self(usize::MAX)
    }

    pub fn property(self, index: usize) -> PropertyId {
        PropertyId {
            entity: self,
            index,
        }
    }
}

impl From<&EntityType> for EntityTypeId {
    fn from(value: &EntityType) -> Self {
        value.id
    }
}

impl fmt::Debug for EntityTypeId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EntityTypeId({})", self.0)
    }
}

impl MappingStrategy {
    pub fn name(self) -> &'static str {
        match self {
            MappingStrategy::Tph => "Tph",
            MappingStrategy::Tpt => "Tpt",
            MappingStrategy::Tpc => "Tpc",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [MappingStrategy::Tph, MappingStrategy::Tpt, MappingStrategy::Tpc]
            .into_iter()
            .find(|strategy| strategy.name() == name)
    }
}
