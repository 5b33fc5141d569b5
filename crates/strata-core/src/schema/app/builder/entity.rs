use super::{
    ComplexPropertyBuilder, DataBuilder, DiscriminatorBuilder, EntityDecl, FragmentBuilder,
    FragmentDecl, IndexBuilder, IndexDecl, JsonBuilder, KeyBuilder, KeyDecl, ModelDecl,
    OwnershipDecl, ProcedureBuilder, ProcedureDecl, PropertyBuilder, RelationshipBuilder,
    RelationshipDecl, SkipDecl, SkipNavigationBuilder, StoreObjectBuilder, TableBuilder,
};
use crate::schema::app::{
    CheckConstraint, ComplexProperty, FunctionMapping, MappingStrategy, ProcedureKind,
    StoreObjectKind, TableMapping, Trigger, Type, ViewMapping,
};
use crate::schema::{ObjectName, Value};
use crate::Error;

/// Configures one entity type.
pub struct EntityTypeBuilder<'a> {
    model: &'a mut ModelDecl,
    index: usize,
}

impl<'a> EntityTypeBuilder<'a> {
    pub(super) fn new(model: &'a mut ModelDecl, index: usize) -> Self {
        Self { model, index }
    }

    fn decl(&mut self) -> &mut EntityDecl {
        &mut self.model.entities[self.index]
    }

    pub fn name(&self) -> &str {
        &self.model.entities[self.index].name
    }

    pub fn has_base_type(&mut self, base: &str) -> &mut Self {
        self.decl().base = Some(base.to_string());
        self
    }

    pub fn is_abstract(&mut self) -> &mut Self {
        self.decl().is_abstract = true;
        self
    }

    /// Sets how the hierarchy rooted at this type is mapped to tables.
    pub fn use_mapping_strategy(&mut self, strategy: MappingStrategy) -> &mut Self {
        self.decl().strategy = Some(strategy);
        self
    }

    /// Declares or configures a scalar property.
    pub fn property(&mut self, name: &str, ty: Type) -> PropertyBuilder<'_> {
        let decl = self.decl();
        let index = match decl.property_index(name) {
            Some(index) => {
                decl.properties[index].ty = ty;
                index
            }
            None => {
                decl.ensure_property(name, ty);
                decl.properties.len() - 1
            }
        };
        PropertyBuilder::new(&mut decl.properties[index])
    }

    pub fn complex_property(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut ComplexPropertyBuilder<'_>),
    ) -> &mut Self {
        let decl = self.decl();
        let index = match decl.complex_properties.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                decl.complex_properties.push(ComplexProperty::new(name));
                decl.complex_properties.len() - 1
            }
        };
        f(&mut ComplexPropertyBuilder::new(
            &mut decl.complex_properties[index],
        ));
        self
    }

    /// Sets the primary key. Only inheritance roots declare keys.
    pub fn has_key(&mut self, properties: &[&str]) -> KeyBuilder<'_> {
        let decl = self.decl();
        decl.keyless = false;
        let key = decl.key.get_or_insert_with(KeyDecl::default);
        key.properties = names(properties);
        KeyBuilder::new(key)
    }

    /// Marks the type as having no key. Keyless types may only be mapped to
    /// views and functions.
    pub fn has_no_key(&mut self) -> &mut Self {
        let decl = self.decl();
        decl.keyless = true;
        decl.key = None;
        self
    }

    pub fn has_alternate_key(&mut self, properties: &[&str]) -> KeyBuilder<'_> {
        let decl = self.decl();
        let properties = names(properties);
        let index = match decl
            .alternate_keys
            .iter()
            .position(|k| k.properties == properties)
        {
            Some(index) => index,
            None => {
                decl.alternate_keys.push(KeyDecl {
                    properties,
                    ..KeyDecl::default()
                });
                decl.alternate_keys.len() - 1
            }
        };
        KeyBuilder::new(&mut decl.alternate_keys[index])
    }

    pub fn has_index(&mut self, properties: &[&str]) -> IndexBuilder<'_> {
        let decl = self.decl();
        let properties = names(properties);
        let index = match decl.indexes.iter().position(|i| i.properties == properties) {
            Some(index) => index,
            None => {
                decl.indexes.push(IndexDecl {
                    properties,
                    ..IndexDecl::default()
                });
                decl.indexes.len() - 1
            }
        };
        IndexBuilder::new(&mut decl.indexes[index])
    }

    /// Declares a relationship in which this type is the dependent and
    /// `principal` the principal. `navigation` is the navigation on this type.
    pub fn has_one(&mut self, principal: &str, navigation: Option<&str>) -> RelationshipBuilder<'_> {
        let decl = self.decl();
        let existing = navigation.and_then(|navigation| {
            decl.relationships.iter().position(|r| {
                r.principal == principal && r.navigation.as_deref() == Some(navigation)
            })
        });
        let index = match existing {
            Some(index) => index,
            None => {
                decl.relationships.push(RelationshipDecl {
                    principal: principal.to_string(),
                    navigation: navigation.map(String::from),
                    ..RelationshipDecl::default()
                });
                decl.relationships.len() - 1
            }
        };
        RelationshipBuilder::new(&mut decl.relationships[index])
    }

    /// Declares a many-to-many navigation to `target`.
    pub fn has_many(&mut self, target: &str, navigation: &str) -> SkipNavigationBuilder<'_> {
        let decl = self.decl();
        let index = match decl
            .skip_navigations
            .iter()
            .position(|s| s.navigation == navigation)
        {
            Some(index) => {
                decl.skip_navigations[index].target = target.to_string();
                index
            }
            None => {
                decl.skip_navigations.push(SkipDecl {
                    navigation: navigation.to_string(),
                    target: target.to_string(),
                    ..SkipDecl::default()
                });
                decl.skip_navigations.len() - 1
            }
        };
        SkipNavigationBuilder::new(&mut decl.skip_navigations[index])
    }

    /// Declares an owned reference reached through `navigation`.
    pub fn owns_one(&mut self, navigation: &str, f: impl FnOnce(&mut EntityTypeBuilder<'_>)) -> &mut Self {
        self.owns(navigation, false, f)
    }

    /// Declares an owned collection reached through `navigation`.
    pub fn owns_many(&mut self, navigation: &str, f: impl FnOnce(&mut EntityTypeBuilder<'_>)) -> &mut Self {
        self.owns(navigation, true, f)
    }

    fn owns(
        &mut self,
        navigation: &str,
        collection: bool,
        f: impl FnOnce(&mut EntityTypeBuilder<'_>),
    ) -> &mut Self {
        let owner = self.name().to_string();
        let name = format!("{owner}.{navigation}");
        let index = self.model.entity_index(&name);

        let owned = &mut self.model.entities[index];
        match &mut owned.ownership {
            Some(ownership) if ownership.owner == owner && ownership.navigation == navigation => {
                ownership.collection = collection;
            }
            Some(_) => {
                let err = Error::invalid_schema(format!(
                    "entity type `{name}` is already owned through another navigation"
                ));
                self.model.errors.push(err);
                return self;
            }
            None => {
                owned.ownership = Some(OwnershipDecl {
                    owner,
                    navigation: navigation.to_string(),
                    collection,
                    required: false,
                    json: false,
                    json_column: None,
                });
            }
        }

        f(&mut EntityTypeBuilder::new(self.model, index));
        self
    }

    /// Owned types only: the owner always has this dependent.
    pub fn is_required(&mut self) -> &mut Self {
        match &mut self.model.entities[self.index].ownership {
            Some(ownership) => ownership.required = true,
            None => self.not_owned("is_required"),
        }
        self
    }

    /// Owned types only: stores the owned graph rooted here in one JSON
    /// column of the owner.
    pub fn to_json(&mut self) -> JsonBuilder<'_> {
        if self.model.entities[self.index].ownership.is_none() {
            self.not_owned("to_json");
            return JsonBuilder::new(None);
        }

        let mut ownership = self.model.entities[self.index].ownership.as_mut();
        if let Some(ownership) = &mut ownership {
            ownership.json = true;
        }
        JsonBuilder::new(ownership)
    }

    fn not_owned(&mut self, method: &str) {
        let err = Error::invalid_schema(format!(
            "`{method}` applies to owned types, but `{}` is not owned",
            self.name()
        ));
        self.model.errors.push(err);
    }

    pub fn to_table(&mut self, name: &str) -> TableBuilder<'_> {
        let decl = self.decl();
        let schema = match &decl.table {
            TableMapping::Table(existing) => existing.schema.clone(),
            _ => None,
        };
        decl.table = TableMapping::Table(ObjectName::with_schema(name, schema));
        TableBuilder::new(decl)
    }

    /// Removes the type from table mapping.
    pub fn has_no_table(&mut self) -> &mut Self {
        self.decl().table = TableMapping::None;
        self
    }

    pub fn to_view(&mut self, name: &str) -> StoreObjectBuilder<'_> {
        let decl = self.decl();
        let view = decl.view.get_or_insert_with(|| ViewMapping {
            name: ObjectName::new(name),
            definition: None,
        });
        view.name.name = name.to_string();
        StoreObjectBuilder::new(&mut view.name, &mut view.definition)
    }

    pub fn to_function(&mut self, name: &str) -> StoreObjectBuilder<'_> {
        let decl = self.decl();
        let function = decl.function.get_or_insert_with(|| FunctionMapping {
            name: ObjectName::new(name),
            definition: None,
        });
        function.name.name = name.to_string();
        StoreObjectBuilder::new(&mut function.name, &mut function.definition)
    }

    pub fn insert_using_stored_procedure(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut ProcedureBuilder<'_>),
    ) -> &mut Self {
        self.procedure(ProcedureKind::Insert, name, f)
    }

    pub fn update_using_stored_procedure(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut ProcedureBuilder<'_>),
    ) -> &mut Self {
        self.procedure(ProcedureKind::Update, name, f)
    }

    pub fn delete_using_stored_procedure(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut ProcedureBuilder<'_>),
    ) -> &mut Self {
        self.procedure(ProcedureKind::Delete, name, f)
    }

    fn procedure(
        &mut self,
        kind: ProcedureKind,
        name: &str,
        f: impl FnOnce(&mut ProcedureBuilder<'_>),
    ) -> &mut Self {
        let decl = self.decl();
        let index = match decl.procedures.iter().position(|p| p.kind == kind) {
            Some(index) => {
                decl.procedures[index].name.name = name.to_string();
                index
            }
            None => {
                decl.procedures.push(ProcedureDecl {
                    kind,
                    name: ObjectName::new(name),
                    parameters: vec![],
                    result_columns: vec![],
                    definition: None,
                });
                decl.procedures.len() - 1
            }
        };
        f(&mut ProcedureBuilder::new(&mut decl.procedures[index]));
        self
    }

    /// Maps some of the type's properties to an additional table sharing the
    /// primary key.
    pub fn split_to_table(&mut self, name: &str, f: impl FnOnce(&mut FragmentBuilder<'_>)) -> &mut Self {
        self.split(StoreObjectKind::Table, name, f)
    }

    /// Maps some of the type's properties to an additional view.
    pub fn split_to_view(&mut self, name: &str, f: impl FnOnce(&mut FragmentBuilder<'_>)) -> &mut Self {
        self.split(StoreObjectKind::View, name, f)
    }

    fn split(
        &mut self,
        kind: StoreObjectKind,
        name: &str,
        f: impl FnOnce(&mut FragmentBuilder<'_>),
    ) -> &mut Self {
        let decl = self.decl();
        let index = match decl
            .fragments
            .iter()
            .position(|fragment| fragment.kind == kind && fragment.name.name == name)
        {
            Some(index) => index,
            None => {
                decl.fragments.push(FragmentDecl {
                    kind,
                    name: ObjectName::new(name),
                    properties: vec![],
                    column_names: vec![],
                    excluded_from_migrations: false,
                    check_constraints: vec![],
                    triggers: vec![],
                    comment: None,
                });
                decl.fragments.len() - 1
            }
        };
        f(&mut FragmentBuilder::new(&mut decl.fragments[index]));
        self
    }

    /// Declares the discriminator property of a TPH hierarchy root.
    pub fn has_discriminator(&mut self, property: &str) -> DiscriminatorBuilder<'_> {
        let decl = self.decl();
        decl.discriminator = Some(property.to_string());
        DiscriminatorBuilder::new(&mut decl.discriminator_value)
    }

    /// Sets the discriminator value identifying rows of this type.
    pub fn has_discriminator_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.decl().discriminator_value = Some(value.into());
        self
    }

    pub fn has_check_constraint(&mut self, name: &str, sql: &str) -> &mut Self {
        let decl = self.decl();
        decl.check_constraints.retain(|c| c.name != name);
        decl.check_constraints.push(CheckConstraint {
            name: name.to_string(),
            sql: sql.to_string(),
        });
        self
    }

    /// Adds a seed row. Rows are told apart by their primary key values.
    pub fn has_data(&mut self) -> DataBuilder<'_> {
        let decl = self.decl();
        decl.data.push(vec![]);
        let row = decl.data.len() - 1;
        DataBuilder::new(&mut decl.data[row])
    }

    pub fn has_trigger(&mut self, name: &str) -> &mut Self {
        let decl = self.decl();
        if !decl.triggers.iter().any(|t| t.name == name) {
            decl.triggers.push(Trigger {
                name: name.to_string(),
            });
        }
        self
    }

    pub fn has_comment(&mut self, comment: &str) -> &mut Self {
        self.decl().comment = Some(comment.to_string());
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.decl().annotations.set(key, value);
        self
    }
}

pub(super) fn names(properties: &[&str]) -> Vec<String> {
    properties.iter().map(|p| p.to_string()).collect()
}
