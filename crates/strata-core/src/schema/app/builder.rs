mod conventions;
mod data;
mod entity;
mod property;
mod relationship;
mod resolve;
mod sequence;
mod store;

pub use data::DataBuilder;
pub use entity::EntityTypeBuilder;
pub use property::{ComplexPropertyBuilder, PropertyBuilder};
pub use relationship::{
    DiscriminatorBuilder, IndexBuilder, KeyBuilder, RelationshipBuilder, SkipNavigationBuilder,
};
pub use sequence::SequenceBuilder;
pub use store::{
    FragmentBuilder, FragmentPropertyBuilder, JsonBuilder, ParameterBuilder, ProcedureBuilder,
    StoreObjectBuilder, TableBuilder,
};

use super::{
    CheckConstraint, ComplexProperty, FunctionMapping, MappingStrategy, Model, ParameterDirection,
    ProcedureKind, Property, ReferentialAction, Sequence, StoreObjectKind, TableMapping, Trigger,
    ViewMapping,
};
use crate::schema::{Annotations, ObjectName, Value};
use crate::{Error, Result};

use indexmap::IndexMap;

/// Mutable builder for a conceptual model.
///
/// Entity types, properties and relationships are declared by name, in any
/// order; references are resolved by [`ModelBuilder::finalize`], which also
/// applies the model conventions (owned keys, join entity types,
/// discriminators, foreign key indexes) and validates the result.
///
/// Declaring the same element twice configures the existing element, so a
/// model can be built up across several calls.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    decl: ModelDecl,
}

#[derive(Debug, Default)]
pub(crate) struct ModelDecl {
    pub(crate) entities: IndexMap<String, EntityDecl>,
    pub(crate) sequences: Vec<Sequence>,
    pub(crate) default_schema: Option<String>,
    pub(crate) product_version: Option<String>,
    pub(crate) annotations: Annotations,

    /// Misuse of the builder API, reported by `finalize`
    pub(crate) errors: Vec<Error>,
}

#[derive(Debug)]
pub(crate) struct EntityDecl {
    pub(crate) name: String,
    pub(crate) base: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) strategy: Option<MappingStrategy>,
    pub(crate) properties: Vec<Property>,
    pub(crate) complex_properties: Vec<ComplexProperty>,
    pub(crate) key: Option<KeyDecl>,
    pub(crate) keyless: bool,
    pub(crate) alternate_keys: Vec<KeyDecl>,
    pub(crate) indexes: Vec<IndexDecl>,
    pub(crate) relationships: Vec<RelationshipDecl>,
    pub(crate) skip_navigations: Vec<SkipDecl>,
    pub(crate) ownership: Option<OwnershipDecl>,
    pub(crate) table: TableMapping,
    pub(crate) excluded_from_migrations: bool,
    pub(crate) view: Option<ViewMapping>,
    pub(crate) function: Option<FunctionMapping>,
    pub(crate) procedures: Vec<ProcedureDecl>,
    pub(crate) fragments: Vec<FragmentDecl>,
    pub(crate) discriminator: Option<String>,
    pub(crate) discriminator_value: Option<Value>,
    pub(crate) check_constraints: Vec<CheckConstraint>,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) comment: Option<String>,
    pub(crate) annotations: Annotations,

    /// Seed rows as property name and value pairs
    pub(crate) data: Vec<Vec<(String, Value)>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct KeyDecl {
    pub(crate) properties: Vec<String>,
    pub(crate) name: Option<String>,
    pub(crate) annotations: Annotations,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct IndexDecl {
    pub(crate) properties: Vec<String>,
    pub(crate) name: Option<String>,
    pub(crate) unique: bool,
    pub(crate) descending: Vec<bool>,
    pub(crate) filter: Option<String>,
    pub(crate) annotations: Annotations,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RelationshipDecl {
    pub(crate) principal: String,
    pub(crate) navigation: Option<String>,
    pub(crate) inverse: Option<String>,
    pub(crate) unique: bool,
    pub(crate) foreign_key: Vec<String>,
    pub(crate) principal_key: Vec<String>,
    pub(crate) required: bool,
    pub(crate) on_delete: Option<ReferentialAction>,
    pub(crate) name: Option<String>,
    pub(crate) ownership: bool,
    pub(crate) annotations: Annotations,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SkipDecl {
    pub(crate) navigation: String,
    pub(crate) target: String,
    pub(crate) inverse: Option<String>,
    pub(crate) join_entity: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct OwnershipDecl {
    pub(crate) owner: String,
    pub(crate) navigation: String,
    pub(crate) collection: bool,
    pub(crate) required: bool,
    pub(crate) json: bool,
    pub(crate) json_column: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct FragmentDecl {
    pub(crate) kind: StoreObjectKind,
    pub(crate) name: ObjectName,
    pub(crate) properties: Vec<String>,
    pub(crate) column_names: Vec<(String, String)>,
    pub(crate) excluded_from_migrations: bool,
    pub(crate) check_constraints: Vec<CheckConstraint>,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ProcedureDecl {
    pub(crate) kind: ProcedureKind,
    pub(crate) name: ObjectName,
    pub(crate) parameters: Vec<ParameterDecl>,
    pub(crate) result_columns: Vec<String>,
    pub(crate) definition: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ParameterDecl {
    pub(crate) property: String,
    pub(crate) name: Option<String>,
    pub(crate) direction: ParameterDirection,
    pub(crate) original_value: bool,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares or configures the entity type `name`.
    pub fn entity(&mut self, name: &str, f: impl FnOnce(&mut EntityTypeBuilder<'_>)) -> &mut Self {
        let index = self.decl.entity_index(name);
        f(&mut EntityTypeBuilder::new(&mut self.decl, index));
        self
    }

    /// Schema used for every store object that does not name one.
    pub fn has_default_schema(&mut self, schema: &str) -> &mut Self {
        self.decl.default_schema = Some(schema.to_string());
        self
    }

    /// Records the version of the tool that wrote the model.
    pub fn product_version(&mut self, version: &str) -> &mut Self {
        self.decl.product_version = Some(version.to_string());
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.decl.annotations.set(key, value);
        self
    }

    /// Declares or configures a sequence.
    pub fn has_sequence(&mut self, name: &str, schema: Option<&str>) -> SequenceBuilder<'_> {
        let name = ObjectName::with_schema(name, schema);
        let index = match self.decl.sequences.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.decl.sequences.push(Sequence::new(name));
                self.decl.sequences.len() - 1
            }
        };
        SequenceBuilder::new(&mut self.decl.sequences[index])
    }

    /// Applies conventions, resolves every reference and validates the
    /// model.
    pub fn finalize(self) -> Result<Model> {
        let mut decl = self.decl;

        if let Some(err) = decl.errors.drain(..).next() {
            return Err(err);
        }

        conventions::apply(&mut decl)?;
        resolve::resolve(decl)
    }
}

impl ModelDecl {
    pub(crate) fn entity_index(&mut self, name: &str) -> usize {
        match self.entities.get_index_of(name) {
            Some(index) => index,
            None => {
                self.entities
                    .insert(name.to_string(), EntityDecl::new(name));
                self.entities.len() - 1
            }
        }
    }
}

impl EntityDecl {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            is_abstract: false,
            strategy: None,
            properties: vec![],
            complex_properties: vec![],
            key: None,
            keyless: false,
            alternate_keys: vec![],
            indexes: vec![],
            relationships: vec![],
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

    pub(crate) fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    /// Returns the property `name`, declaring it with `ty` when missing.
    pub(crate) fn ensure_property(&mut self, name: &str, ty: super::Type) -> &mut Property {
        let index = match self.property_index(name) {
            Some(index) => index,
            None => {
                self.properties.push(Property::new(name, ty));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    /// Returns the property `name`, declaring it as a reference to `source`
    /// when missing.
    pub(crate) fn ensure_reference(&mut self, name: &str, source: &Property) -> &mut Property {
        let index = match self.property_index(name) {
            Some(index) => index,
            None => {
                self.properties.push(source.referencing(name));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    pub(crate) fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}
