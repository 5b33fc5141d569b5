use super::{EntityDecl, FragmentDecl, KeyDecl, ModelDecl, ProcedureDecl};
use crate::schema::app::{
    ColumnOverride, EntityType, EntityTypeId, ForeignKey, Index, Key, Model, Ownership,
    ProcedureParameter, Property, PropertyId, ReferentialAction, SeedRow, SkipNavigation,
    SplitFragment, StoredProcedureMapping,
};
use crate::schema::Value;
use crate::{Error, Result};

use indexmap::IndexMap;
use tracing::debug;

/// Turns declarations into a model: names become IDs and every reference is
/// checked.
pub(super) fn resolve(mut decl: ModelDecl) -> Result<Model> {
    canonicalize(&mut decl);

    // IDs follow name order so the model does not depend on declaration
    // order.
    let mut names: Vec<&String> = decl.entities.keys().collect();
    names.sort();
    let ids: IndexMap<String, EntityTypeId> = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), EntityTypeId(index)))
        .collect();

    let resolver = Resolver { decl: &decl, ids };

    for sequence in &decl.sequences {
        if !sequence.ty.is_integer() {
            return Err(Error::invalid_schema(format!(
                "sequence `{}` has type {}; sequences must have an integer type",
                sequence.name, sequence.ty
            )));
        }
    }

    let mut entity_types = IndexMap::with_capacity(decl.entities.len());
    for (name, id) in &resolver.ids {
        let entity = resolver.entity_type(&decl.entities[name], *id)?;
        entity_types.insert(*id, entity);
    }

    // Derived lists, sorted by name since IDs are.
    let bases: Vec<(EntityTypeId, EntityTypeId)> = entity_types
        .values()
        .filter_map(|e| e.base.map(|base| (base, e.id)))
        .collect();
    for (base, derived) in bases {
        entity_types[&base].derived.push(derived);
    }
    for entity in entity_types.values_mut() {
        entity.derived.sort();
    }

    debug!(entity_types = entity_types.len(), "model finalized");

    Ok(Model {
        entity_types,
        sequences: decl.sequences,
        default_schema: decl.default_schema,
        product_version: decl.product_version,
        annotations: decl.annotations,
    })
}

/// Puts declarations in the order the model exposes them: key properties
/// first in key order, then properties by name; sequences by name.
fn canonicalize(decl: &mut ModelDecl) {
    for entity in decl.entities.values_mut() {
        let key = entity
            .key
            .as_ref()
            .map(|key| key.properties.clone())
            .unwrap_or_default();
        entity.properties.sort_by_cached_key(|property| {
            let position = key.iter().position(|k| *k == property.name);
            (position.unwrap_or(usize::MAX), property.name.clone())
        });
    }
    decl.sequences.sort_by(|a, b| a.name.cmp(&b.name));
}

struct Resolver<'a> {
    decl: &'a ModelDecl,
    ids: IndexMap<String, EntityTypeId>,
}

impl Resolver<'_> {
    fn entity_id(&self, name: &str, referrer: &str) -> Result<EntityTypeId> {
        self.ids.get(name).copied().ok_or_else(|| {
            Error::invalid_schema(format!(
                "entity type `{name}` referenced from `{referrer}` is not declared"
            ))
        })
    }

    /// Resolves a property visible on `entity`, searching base types.
    fn property_id(&self, entity: &str, property: &str) -> Result<PropertyId> {
        let mut current = self.decl.entities.get(entity);
        while let Some(e) = current {
            if let Some(index) = e.property_index(property) {
                return Ok(self.ids[&e.name].property(index));
            }
            current = e.base.as_deref().and_then(|b| self.decl.entities.get(b));
        }
        Err(Error::invalid_schema(format!(
            "property `{property}` is not declared on `{entity}`"
        )))
    }

    fn property_ids(&self, entity: &str, properties: &[String]) -> Result<Vec<PropertyId>> {
        properties
            .iter()
            .map(|property| self.property_id(entity, property))
            .collect()
    }

    fn key(&self, entity: &str, key: &KeyDecl) -> Result<Key> {
        Ok(Key {
            properties: self.property_ids(entity, &key.properties)?,
            name: key.name.clone(),
            annotations: key.annotations.clone(),
        })
    }

    fn root<'b>(&'b self, mut entity: &'b EntityDecl) -> &'b EntityDecl {
        while let Some(base) = entity.base.as_deref().and_then(|b| self.decl.entities.get(b)) {
            entity = base;
        }
        entity
    }

    fn entity_type(&self, decl: &EntityDecl, id: EntityTypeId) -> Result<EntityType> {
        let name = &decl.name;
        let mut entity = EntityType::new(id, name);

        entity.base = match &decl.base {
            Some(base) => Some(self.entity_id(base, name)?),
            None => None,
        };
        entity.is_abstract = decl.is_abstract;
        entity.strategy = decl.strategy;
        entity.keyless = decl.keyless;

        entity.properties = self.properties(decl, id)?;
        entity.complex_properties = decl.complex_properties.clone();

        if let Some(key) = &decl.key {
            if decl.base.is_some() {
                return Err(Error::invalid_schema(format!(
                    "`{name}` declares a key, but keys are declared on the hierarchy root"
                )));
            }
            entity.primary_key = Some(self.key(name, key)?);
        }

        entity.alternate_keys = decl
            .alternate_keys
            .iter()
            .map(|key| self.key(name, key))
            .collect::<Result<_>>()?;

        for index in &decl.indexes {
            if !index.descending.is_empty() && index.descending.len() != index.properties.len() {
                return Err(Error::invalid_schema(format!(
                    "index on `{name}` lists {} sort orders for {} properties",
                    index.descending.len(),
                    index.properties.len()
                )));
            }
            entity.indexes.push(Index {
                properties: self.property_ids(name, &index.properties)?,
                name: index.name.clone(),
                unique: index.unique,
                descending: index.descending.clone(),
                filter: index.filter.clone(),
                annotations: index.annotations.clone(),
            });
        }

        for relationship in &decl.relationships {
            let principal = self.entity_id(&relationship.principal, name)?;
            let properties = self.property_ids(name, &relationship.foreign_key)?;
            let principal_key = if relationship.principal_key.is_empty() {
                let root = self.root(&self.decl.entities[&relationship.principal]);
                match &root.key {
                    Some(key) => self.property_ids(&root.name, &key.properties)?,
                    None => {
                        return Err(Error::invalid_schema(format!(
                            "principal `{}` of a relationship on `{name}` has no key",
                            relationship.principal
                        )))
                    }
                }
            } else {
                self.property_ids(&relationship.principal, &relationship.principal_key)?
            };

            if properties.len() != principal_key.len() {
                return Err(Error::invalid_schema(format!(
                    "foreign key {:?} on `{name}` has {} properties but the key of `{}` has {}",
                    relationship.foreign_key,
                    properties.len(),
                    relationship.principal,
                    principal_key.len()
                )));
            }

            let on_delete = relationship.on_delete.unwrap_or(if relationship.required {
                ReferentialAction::Cascade
            } else {
                ReferentialAction::NoAction
            });

            entity.foreign_keys.push(ForeignKey {
                principal,
                properties,
                principal_key,
                navigation: relationship.navigation.clone(),
                inverse: relationship.inverse.clone(),
                unique: relationship.unique,
                required: relationship.required,
                on_delete,
                name: relationship.name.clone(),
                is_ownership: relationship.ownership,
                annotations: relationship.annotations.clone(),
            });
        }

        for skip in &decl.skip_navigations {
            let Some(join_entity) = &skip.join_entity else {
                return Err(Error::invalid_schema(format!(
                    "many-to-many navigation `{name}.{}` has no join entity type",
                    skip.navigation
                )));
            };
            entity.skip_navigations.push(SkipNavigation {
                name: skip.navigation.clone(),
                target: self.entity_id(&skip.target, name)?,
                inverse: skip.inverse.clone(),
                join_entity: self.entity_id(join_entity, name)?,
            });
        }

        if let Some(ownership) = &decl.ownership {
            entity.ownership = Some(Ownership {
                owner: self.entity_id(&ownership.owner, name)?,
                navigation: ownership.navigation.clone(),
                collection: ownership.collection,
                required: ownership.required,
                json: ownership.json,
                json_column: ownership.json_column.clone(),
            });
        }

        entity.table = decl.table.clone();
        entity.excluded_from_migrations = decl.excluded_from_migrations;
        entity.view = decl.view.clone();
        entity.function = decl.function.clone();

        for procedure in &decl.procedures {
            entity.procedures.push(self.procedure(name, procedure)?);
        }

        if !decl.fragments.is_empty() {
            let in_hierarchy = decl.base.is_some()
                || self
                    .decl
                    .entities
                    .values()
                    .any(|e| e.base.as_deref() == Some(name.as_str()));
            if in_hierarchy {
                return Err(Error::invalid_schema(format!(
                    "`{name}` is split across store objects but is part of an inheritance hierarchy"
                )));
            }
        }
        for fragment in &decl.fragments {
            let split = self.fragment(decl, &entity, fragment)?;
            for (property, column_name) in self.overrides(fragment) {
                let index = entity.properties.iter().position(|p| p.name == property);
                if let Some(index) = index {
                    entity.properties[index].overrides.push(ColumnOverride {
                        store: fragment.name.clone(),
                        column_name,
                    });
                }
            }
            entity.fragments.push(split);
        }

        if let Some(discriminator) = &decl.discriminator {
            let index = decl.property_index(discriminator).ok_or_else(|| {
                Error::invalid_schema(format!(
                    "discriminator `{discriminator}` is not a property of `{name}`"
                ))
            })?;
            entity.discriminator = Some(id.property(index));
        }
        entity.discriminator_value = decl.discriminator_value.clone();

        entity.check_constraints = decl.check_constraints.clone();
        entity.triggers = decl.triggers.clone();
        entity.comment = decl.comment.clone();
        entity.annotations = decl.annotations.clone();
        entity.data = self.seed_rows(decl)?;

        Ok(entity)
    }

    /// Seed rows must set the whole key, and no two rows may share a key.
    fn seed_rows(&self, decl: &EntityDecl) -> Result<Vec<SeedRow>> {
        let name = &decl.name;
        if decl.data.is_empty() {
            return Ok(vec![]);
        }
        if decl.is_abstract {
            return Err(Error::invalid_schema(format!(
                "`{name}` is abstract and cannot have seed data"
            )));
        }
        let root = self.root(decl);
        let key = match &root.key {
            Some(key) if !decl.keyless => self.property_ids(&root.name, &key.properties)?,
            _ => {
                return Err(Error::invalid_schema(format!(
                    "`{name}` has seed data but no key"
                )))
            }
        };

        let mut rows: Vec<SeedRow> = Vec::with_capacity(decl.data.len());
        for values in &decl.data {
            let row = SeedRow {
                values: values
                    .iter()
                    .map(|(property, value)| Ok((self.property_id(name, property)?, value.clone())))
                    .collect::<Result<_>>()?,
            };

            let key_values: Vec<&Value> = key
                .iter()
                .filter_map(|property| row.get(*property).filter(|value| !value.is_null()))
                .collect();
            if key_values.len() != key.len() {
                return Err(Error::invalid_schema(format!(
                    "a seed row of `{name}` does not set every key property"
                )));
            }
            let duplicate = rows.iter().any(|other| {
                key.iter()
                    .zip(&key_values)
                    .all(|(property, value)| other.get(*property) == Some(*value))
            });
            if duplicate {
                return Err(Error::invalid_schema(format!(
                    "two seed rows of `{name}` have the key {}",
                    key_values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                )));
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn properties(&self, decl: &EntityDecl, id: EntityTypeId) -> Result<Vec<Property>> {
        let name = &decl.name;
        let mut properties = Vec::with_capacity(decl.properties.len());

        for (index, property) in decl.properties.iter().enumerate() {
            let duplicate = decl.properties[..index]
                .iter()
                .any(|p| p.name == property.name);
            let inherited = decl
                .base
                .as_deref()
                .is_some_and(|base| self.property_id(base, &property.name).is_ok());
            if duplicate || inherited {
                return Err(Error::invalid_schema(format!(
                    "property `{}` is declared more than once on `{name}`",
                    property.name
                )));
            }

            if property.default.is_some() && property.computed.is_some() {
                return Err(Error::invalid_schema(format!(
                    "`{name}.{}` has both a default value and computed SQL",
                    property.name
                )));
            }

            if property.value_generated_explicit
                && property.value_generated.on_add()
                && (property.default.is_some() || property.computed.is_some())
                && property.sequence.is_none()
            {
                return Err(Error::invalid_schema(format!(
                    "`{name}.{}` is generated on add and also declares a default or computed value",
                    property.name
                )));
            }

            if let Some(sequence) = &property.sequence {
                let declared = self.decl.sequences.iter().any(|s| &s.name == sequence);
                if !declared {
                    return Err(Error::invalid_schema(format!(
                        "`{name}.{}` uses sequence `{sequence}`, which is not declared",
                        property.name
                    )));
                }
            }

            let mut property = property.clone();
            property.id = id.property(index);
            property.overrides.clear();
            properties.push(property);
        }

        Ok(properties)
    }

    fn fragment(
        &self,
        decl: &EntityDecl,
        entity: &EntityType,
        fragment: &FragmentDecl,
    ) -> Result<SplitFragment> {
        let name = &decl.name;
        let key = decl.key.as_ref().map(|k| k.properties.as_slice()).unwrap_or(&[]);

        let mut properties = Vec::with_capacity(fragment.properties.len());
        for property in &fragment.properties {
            if key.contains(property) {
                return Err(Error::invalid_schema(format!(
                    "key property `{name}.{property}` cannot be moved to `{}`; every fragment repeats the key",
                    fragment.name
                )));
            }

            let taken = decl
                .fragments
                .iter()
                .take_while(|f| !std::ptr::eq(*f, fragment))
                .any(|f| f.properties.contains(property));
            if taken {
                return Err(Error::invalid_schema(format!(
                    "property `{name}.{property}` is mapped to more than one split fragment"
                )));
            }

            let index = decl.property_index(property).ok_or_else(|| {
                Error::invalid_schema(format!(
                    "split fragment `{}` lists `{property}`, which is not a property of `{name}`",
                    fragment.name
                ))
            })?;
            properties.push(entity.id.property(index));
        }

        for (property, _) in &fragment.column_names {
            if !fragment.properties.contains(property) {
                return Err(Error::invalid_schema(format!(
                    "column name override for `{name}.{property}` targets `{}`, which does not map it",
                    fragment.name
                )));
            }
        }

        Ok(SplitFragment {
            kind: fragment.kind,
            name: fragment.name.clone(),
            properties,
            excluded_from_migrations: fragment.excluded_from_migrations,
            check_constraints: fragment.check_constraints.clone(),
            triggers: fragment.triggers.clone(),
            comment: fragment.comment.clone(),
        })
    }

    /// Column name overrides of a fragment, in the fragment's property order.
    fn overrides(&self, fragment: &FragmentDecl) -> Vec<(String, String)> {
        fragment
            .properties
            .iter()
            .filter_map(|property| {
                fragment
                    .column_names
                    .iter()
                    .find(|(p, _)| p == property)
                    .map(|(p, column)| (p.clone(), column.clone()))
            })
            .collect()
    }

    fn procedure(&self, entity: &str, procedure: &ProcedureDecl) -> Result<StoredProcedureMapping> {
        let parameters = procedure
            .parameters
            .iter()
            .map(|parameter| {
                Ok(ProcedureParameter {
                    property: self.property_id(entity, &parameter.property)?,
                    name: parameter.name.clone(),
                    direction: parameter.direction,
                    original_value: parameter.original_value,
                })
            })
            .collect::<Result<_>>()?;

        Ok(StoredProcedureMapping {
            kind: procedure.kind,
            name: procedure.name.clone(),
            parameters,
            result_columns: self.property_ids(entity, &procedure.result_columns)?,
            definition: procedure.definition.clone(),
        })
    }
}
