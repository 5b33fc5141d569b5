use super::{tpc, tph, tpt, BuildSchema};
use crate::schema::app::{
    ComplexProperty, EntityType, EntityTypeId, MappingStrategy, Ownership, Property, PropertyId,
    SplitFragment, StoreObjectKind, ValueGenerated,
};
use crate::schema::db::{self, Column, ColumnId, ColumnMapping, Facets, StoreObjectId, TableId};
use crate::schema::mapping::PropertyMapping;
use crate::schema::{Annotations, ComputedColumn, DefaultValue, ObjectName};
use crate::{err, Error, Result};

use indexmap::IndexMap;

/// One property's claim on a column, before aggregation.
#[derive(Debug, Clone)]
pub(super) struct Contribution {
    entity: EntityTypeId,

    /// Property path within the entity type
    path: String,

    property: Option<PropertyId>,

    /// Column name
    name: String,

    ty: db::Type,
    nullable: bool,
    default: Option<DefaultValue>,
    computed: Option<ComputedColumn>,
    value_generated: ValueGenerated,
    concurrency_token: bool,
    comment: Option<String>,
    collation: Option<String>,
    annotations: Annotations,

    /// Position in the primary key
    key_position: Option<usize>,

    /// Inheritance depth of the declaring type
    depth: usize,
}

/// How an entity type's members are laid out in one store object.
#[derive(Debug, Clone)]
pub(super) struct Placement {
    /// Name column name overrides are keyed by
    pub(super) store: ObjectName,

    /// Prepended to column names: `Address_` for an owned `Address`
    pub(super) prefix: String,

    /// Every column is nullable
    pub(super) optional: bool,

    /// Key columns take their values from another row, so the store never
    /// generates them here
    pub(super) dependent_key: bool,

    /// Column names for each key position when the key columns belong to
    /// an owner
    pub(super) key_columns: Option<Vec<String>>,

    pub(super) depth: usize,
}

/// A column with the contributions it was built from.
struct Aggregate {
    column: Column,
    contributions: Vec<Contribution>,
    order: (usize, usize, String),
}

impl Contribution {
    /// Drops everything only a table column carries.
    pub(super) fn into_result_column(self) -> Self {
        Self {
            default: None,
            computed: None,
            value_generated: ValueGenerated::Never,
            ..self
        }
    }
}

impl Placement {
    pub(super) fn new(store: ObjectName, depth: usize) -> Self {
        Self {
            store,
            prefix: String::new(),
            optional: false,
            dependent_key: false,
            key_columns: None,
            depth,
        }
    }

    pub(super) fn column_name(&self, property: &Property, key_position: Option<usize>) -> String {
        if let (Some(position), Some(names)) = (key_position, &self.key_columns) {
            if let Some(name) = names.get(position) {
                return name.clone();
            }
        }

        match property.column_name_in(&self.store) {
            Some(name) => name.to_string(),
            None => format!("{}{}", self.prefix, property.name),
        }
    }

    fn nested(&self, complex: &ComplexProperty) -> Placement {
        Placement {
            prefix: format!("{}{}_", self.prefix, complex.name),
            optional: self.optional || !complex.required,
            key_columns: None,
            ..self.clone()
        }
    }
}

impl BuildSchema<'_> {
    /// Places every property of every table-mapped entity type, then
    /// aggregates the claims into columns.
    pub(super) fn build_columns(&mut self) -> Result<()> {
        let app = self.app;

        for id in app.canonical_order() {
            let entity = app.entity_type(id);

            if let Some(ownership) = entity.ownership.as_ref().filter(|o| o.json) {
                self.place_json_column(entity, ownership);
                continue;
            }

            let Some(table) = self.targets.get(&id).copied().flatten() else {
                continue;
            };

            let placement = self.main_placement(entity, table);
            self.placements.insert(id, (table, placement.clone()));

            let (properties, complex_properties) = match (&entity.ownership, app.strategy_of(id)) {
                (Some(_), _) => tph::members(entity),
                (None, MappingStrategy::Tph) => tph::members(entity),
                (None, MappingStrategy::Tpt) => tpt::members(app, entity),
                (None, MappingStrategy::Tpc) => tpc::members(app, entity),
            };
            let key = app
                .primary_key_of(id)
                .map(|key| key.properties.as_slice())
                .unwrap_or_default();

            for property in properties {
                let key_position = key.iter().position(|k| *k == property.id);
                let fragment = entity
                    .fragments
                    .iter()
                    .find(|f| f.kind == StoreObjectKind::Table && f.properties.contains(&property.id));

                let path = property.name.clone();
                match fragment {
                    Some(fragment) => {
                        let (table, placement) = self.fragment_placement(fragment);
                        self.place(table, entity, &placement, property, path, key_position)?;
                    }
                    None => self.place(table, entity, &placement, property, path, key_position)?,
                }
            }

            for complex in complex_properties {
                self.place_complex(table, entity, &placement, complex, "")?;
            }

            // Every table fragment repeats the key
            for fragment in &entity.fragments {
                if fragment.kind != StoreObjectKind::Table {
                    continue;
                }
                let (table, placement) = self.fragment_placement(fragment);
                for (position, property) in key.iter().enumerate() {
                    let property = app.property(*property);
                    self.place(table, entity, &placement, property, property.name.clone(), Some(position))?;
                }
            }
        }

        let contributions = std::mem::take(&mut self.contributions);
        for (index, contributions) in contributions.into_iter().enumerate() {
            let table = TableId(index);
            let name = self.tables[index].name.clone();
            let columns = self.aggregate(table.into(), &name, contributions)?;
            self.tables[index].columns = columns;
        }

        Ok(())
    }

    fn main_placement(&self, entity: &EntityType, table: TableId) -> Placement {
        let app = self.app;
        let store = self.tables[table.0].name.clone();

        if let Some(ownership) = &entity.ownership {
            let colocated = self
                .placements
                .get(&ownership.owner)
                .filter(|(owner_table, _)| *owner_table == table);

            return match colocated {
                Some((_, owner)) => Placement {
                    store: owner.store.clone(),
                    prefix: format!("{}{}_", owner.prefix, ownership.navigation),
                    optional: owner.optional || !ownership.required,
                    dependent_key: true,
                    key_columns: Some(self.key_column_names(ownership.owner, owner)),
                    depth: owner.depth,
                },
                None => Placement::new(store, 0),
            };
        }

        let depth = app.depth_of(entity.id);
        match app.strategy_of(entity.id) {
            MappingStrategy::Tph => tph::placement(entity, store, depth),
            MappingStrategy::Tpt => tpt::placement(entity, store, depth),
            MappingStrategy::Tpc => tpc::placement(store, depth),
        }
    }

    fn fragment_placement(&self, fragment: &SplitFragment) -> (TableId, Placement) {
        let table = self.table_lookup[&self.qualify(&fragment.name)];
        let placement = Placement {
            dependent_key: true,
            ..Placement::new(fragment.name.clone(), 0)
        };
        (table, placement)
    }

    /// Names of the key columns `owner` uses under `placement`.
    fn key_column_names(&self, owner: EntityTypeId, placement: &Placement) -> Vec<String> {
        let Some(key) = self.app.primary_key_of(owner) else {
            return vec![];
        };
        key.properties
            .iter()
            .enumerate()
            .map(|(position, id)| placement.column_name(self.app.property(*id), Some(position)))
            .collect()
    }

    fn place(
        &mut self,
        table: TableId,
        entity: &EntityType,
        placement: &Placement,
        property: &Property,
        path: String,
        key_position: Option<usize>,
    ) -> Result<()> {
        let contribution = self.contribution(entity, placement, property, path, key_position)?;
        self.contributions[table.0].push(contribution);
        Ok(())
    }

    fn place_complex(
        &mut self,
        table: TableId,
        entity: &EntityType,
        placement: &Placement,
        complex: &ComplexProperty,
        path: &str,
    ) -> Result<()> {
        let nested = placement.nested(complex);
        let path = format!("{path}{}.", complex.name);

        for property in &complex.properties {
            self.place(table, entity, &nested, property, format!("{path}{}", property.name), None)?;
        }
        for complex in &complex.complex_properties {
            self.place_complex(table, entity, &nested, complex, &path)?;
        }
        Ok(())
    }

    /// The single column a JSON-mapped owned graph is stored in, claimed on
    /// behalf of the owner.
    fn place_json_column(&mut self, entity: &EntityType, ownership: &Ownership) {
        let Some((table, owner)) = self.placements.get(&ownership.owner).cloned() else {
            // The owner is not stored in a table, or is itself in a document
            return;
        };

        let name = match &ownership.json_column {
            Some(name) => name.clone(),
            None => format!("{}{}", owner.prefix, ownership.navigation),
        };

        tracing::debug!(entity = %entity.name, column = %name, "mapping owned graph to a JSON column");
        self.contributions[table.0].push(Contribution {
            entity: ownership.owner,
            path: ownership.navigation.clone(),
            property: None,
            name,
            ty: db::Type::Json,
            nullable: owner.optional || !ownership.required,
            default: None,
            computed: None,
            value_generated: ValueGenerated::Never,
            concurrency_token: false,
            comment: None,
            collation: None,
            annotations: Annotations::new(),
            key_position: None,
            depth: owner.depth,
        });
    }

    /// Builds a property's claim on a column under `placement`.
    pub(super) fn contribution(
        &self,
        entity: &EntityType,
        placement: &Placement,
        property: &Property,
        path: String,
        key_position: Option<usize>,
    ) -> Result<Contribution> {
        let app = self.app;
        let is_key = key_position.is_some();

        let mut default = property.default.clone();
        let mut computed = property.computed.clone();
        let mut value_generated = property.effective_value_generated();

        if let Some(sequence) = &property.sequence {
            default = Some(DefaultValue::Sql(next_value_for(&self.qualify(sequence))));
        } else if is_key && default.is_none() {
            if let Some(sequence) = self.tpc_sequences.get(&app.root_of(entity.id).id) {
                default = Some(DefaultValue::Sql(next_value_for(sequence)));
            }
        }

        if is_key && placement.dependent_key {
            default = None;
            computed = None;
            value_generated = ValueGenerated::Never;
        }

        let depth = if property.id.is_placeholder() || entity.is_owned() {
            placement.depth
        } else {
            app.depth_of(property.id.entity)
        };

        Ok(Contribution {
            entity: entity.id,
            property: (!property.id.is_placeholder()).then_some(property.id),
            name: placement.column_name(property, key_position),
            ty: self.store_type(entity, &path, property)?,
            path,
            nullable: !is_key && (property.nullable || placement.optional),
            default,
            computed,
            value_generated,
            concurrency_token: property.concurrency_token,
            comment: property.comment.clone(),
            collation: property.collation.clone(),
            annotations: property.annotations.clone(),
            key_position,
            depth,
        })
    }

    pub(super) fn store_type(&self, entity: &EntityType, path: &str, property: &Property) -> Result<db::Type> {
        let facets = Facets {
            max_length: property.max_length,
            fixed_length: property.fixed_length,
            precision: property.precision,
            scale: property.scale,
        };

        db::Type::from_app(
            property.ty,
            property.column_type.as_deref(),
            &facets,
            &self.builder.storage_types,
        )
        .map_err(|e| e.context(err!("invalid store type for `{}.{path}`", entity.name)))
    }

    /// Merges claims into columns, ordered key columns first, then by
    /// inheritance depth, then by name, and records the mapping.
    pub(super) fn aggregate(
        &mut self,
        store: StoreObjectId,
        store_name: &ObjectName,
        contributions: Vec<Contribution>,
    ) -> Result<Vec<Column>> {
        let mut groups: IndexMap<String, Vec<Contribution>> = IndexMap::new();
        for contribution in contributions {
            groups
                .entry(contribution.name.clone())
                .or_default()
                .push(contribution);
        }

        let mut aggregates = groups
            .into_values()
            .map(|group| self.merge(store_name, group))
            .collect::<Result<Vec<_>>>()?;
        aggregates.sort_by(|a, b| a.order.cmp(&b.order));

        let mut columns = Vec::with_capacity(aggregates.len());
        for (index, aggregate) in aggregates.into_iter().enumerate() {
            let Aggregate {
                mut column,
                contributions,
                ..
            } = aggregate;
            column.id = ColumnId { store, index };

            for contribution in contributions {
                self.mapping
                    .entity_type_mut(contribution.entity)
                    .fragment_mut(store)
                    .properties
                    .push(PropertyMapping {
                        path: contribution.path,
                        property: contribution.property,
                        column: column.id,
                    });
            }
            columns.push(column);
        }

        Ok(columns)
    }

    fn merge(&self, store: &ObjectName, group: Vec<Contribution>) -> Result<Aggregate> {
        let describe = |c: &Contribution| format!("{}.{}", self.app.entity_type(c.entity).name, c.path);

        let first = &group[0];
        let mut column = Column::new(ColumnId::placeholder(), first.name.clone(), first.ty.clone());
        let mut default_from: Option<&Contribution> = None;
        let mut computed_from: Option<&Contribution> = None;
        let mut order = (usize::MAX, usize::MAX, first.name.clone());

        for contribution in &group {
            if contribution.ty != column.ty {
                return Err(Error::conflicting_column(
                    store.to_string(),
                    &column.name,
                    describe(first),
                    describe(contribution),
                    "type",
                ));
            }

            if let Some(default) = &contribution.default {
                match default_from {
                    Some(from) if from.default.as_ref() != Some(default) => {
                        return Err(Error::conflicting_column(
                            store.to_string(),
                            &column.name,
                            describe(from),
                            describe(contribution),
                            "default value",
                        ))
                    }
                    Some(_) => {}
                    None => default_from = Some(contribution),
                }
            }

            if let Some(computed) = &contribution.computed {
                match computed_from {
                    Some(from) if from.computed.as_ref() != Some(computed) => {
                        return Err(Error::conflicting_column(
                            store.to_string(),
                            &column.name,
                            describe(from),
                            describe(contribution),
                            "computed SQL",
                        ))
                    }
                    Some(_) => {}
                    None => computed_from = Some(contribution),
                }
            }

            column.nullable |= contribution.nullable;
            column.concurrency_token |= contribution.concurrency_token;
            if column.value_generated == ValueGenerated::Never {
                column.value_generated = contribution.value_generated;
            }
            if column.comment.is_none() {
                column.comment = contribution.comment.clone();
            }
            if column.collation.is_none() {
                column.collation = contribution.collation.clone();
            }
            column.annotations.extend(&contribution.annotations);

            let mapping = ColumnMapping {
                entity: self.app.entity_type(contribution.entity).name.clone(),
                property: contribution.path.clone(),
            };
            if !column.mappings.contains(&mapping) {
                column.mappings.push(mapping);
            }

            order.0 = order.0.min(contribution.key_position.unwrap_or(usize::MAX));
            order.1 = order.1.min(contribution.depth);
        }

        column.default = default_from.and_then(|c| c.default.clone());
        column.computed = computed_from.and_then(|c| c.computed.clone());

        Ok(Aggregate {
            column,
            contributions: group,
            order,
        })
    }
}

/// Default SQL drawing the next value of a sequence.
pub(super) fn next_value_for(sequence: &ObjectName) -> String {
    match &sequence.schema {
        Some(schema) => format!("NEXT VALUE FOR [{schema}].[{}]", sequence.name),
        None => format!("NEXT VALUE FOR [{}]", sequence.name),
    }
}
