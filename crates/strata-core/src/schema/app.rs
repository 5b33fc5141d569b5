mod builder;
pub use builder::{
    ComplexPropertyBuilder, DataBuilder, DiscriminatorBuilder, EntityTypeBuilder, FragmentBuilder,
    FragmentPropertyBuilder, IndexBuilder, JsonBuilder, KeyBuilder, ModelBuilder,
    ParameterBuilder, ProcedureBuilder, PropertyBuilder, RelationshipBuilder, SequenceBuilder,
    SkipNavigationBuilder, StoreObjectBuilder, TableBuilder,
};

mod complex;
pub use complex::ComplexProperty;

mod data;
pub use data::SeedRow;

mod entity;
pub use entity::{EntityType, EntityTypeId, MappingStrategy, Ownership, TableMapping};

mod fk;
pub use fk::{ForeignKey, ReferentialAction};

mod fragment;
pub use fragment::{
    FunctionMapping, ParameterDirection, ProcedureKind, ProcedureParameter, SplitFragment,
    StoreObjectKind, StoredProcedureMapping, ViewMapping,
};

mod index;
pub use index::Index;

mod key;
pub use key::Key;

mod model;
pub use model::Model;

mod property;
pub use property::{ColumnOverride, Property, PropertyId, ValueGenerated};

mod sequence;
pub use sequence::{Sequence, SequenceCache};

mod skip_navigation;
pub use skip_navigation::SkipNavigation;

mod ty;
pub use ty::Type;

/// A named SQL check constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConstraint {
    pub name: String,
    pub sql: String,
}

/// A store trigger, tracked by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub name: String,
}
