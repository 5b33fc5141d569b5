//! Model conventions applied by `ModelBuilder::finalize`.
//!
//! Every convention only fills in what is missing. Applying them to a model
//! that already carries their results (a model replayed from a snapshot)
//! changes nothing.

use super::{IndexDecl, KeyDecl, ModelDecl, RelationshipDecl};
use crate::schema::app::{MappingStrategy, Property, ReferentialAction, Type, ValueGenerated};
use crate::schema::Value;
use crate::{Error, Result};

use tracing::debug;

/// Default name of the discriminator property.
const DISCRIMINATOR: &str = "Discriminator";

/// Name of the key property added to owned collections.
const OWNED_ID: &str = "Id";

pub(super) fn apply(decl: &mut ModelDecl) -> Result<()> {
    check_bases(decl)?;
    owned_types(decl)?;
    join_entity_types(decl)?;
    discriminators(decl)?;
    foreign_key_properties(decl)?;
    foreign_key_indexes(decl);
    Ok(())
}

fn check_bases(decl: &ModelDecl) -> Result<()> {
    for entity in decl.entities.values() {
        let Some(base) = &entity.base else { continue };

        if !decl.entities.contains_key(base) {
            return Err(Error::invalid_schema(format!(
                "base type `{base}` of `{}` is not declared",
                entity.name
            )));
        }

        if entity.ownership.is_some() {
            return Err(Error::invalid_schema(format!(
                "owned type `{}` cannot have a base type",
                entity.name
            )));
        }

        // Walking more steps than there are types means the chain loops.
        let mut current = base.as_str();
        for _ in 0..decl.entities.len() {
            match decl.entities.get(current).and_then(|e| e.base.as_ref()) {
                Some(next) if next == &entity.name => {
                    return Err(Error::invalid_schema(format!(
                        "inheritance cycle through `{}`",
                        entity.name
                    )));
                }
                Some(next) => current = next,
                None => break,
            }
        }
    }
    Ok(())
}

/// Root of the hierarchy `name` belongs to. Bases are checked beforehand.
fn root_name<'a>(decl: &'a ModelDecl, name: &'a str) -> &'a str {
    let mut current = name;
    while let Some(base) = decl.entities.get(current).and_then(|e| e.base.as_deref()) {
        current = base;
    }
    current
}

/// Primary key properties of `name`.
fn key_of(decl: &ModelDecl, name: &str) -> Result<Vec<(String, Property)>> {
    let root = &decl.entities[root_name(decl, name)];
    let Some(key) = &root.key else {
        return Err(Error::invalid_schema(format!(
            "entity type `{}` has no key",
            root.name
        )));
    };
    key.properties
        .iter()
        .map(|property| match root.property_index(property) {
            Some(index) => Ok((property.clone(), root.properties[index].clone())),
            None => Err(Error::invalid_schema(format!(
                "key property `{property}` is not declared on `{}`",
                root.name
            ))),
        })
        .collect()
}

/// Key properties referenced by a relationship: the principal key when one
/// is named, the principal's primary key otherwise.
fn principal_key_of(
    decl: &ModelDecl,
    principal: &str,
    principal_key: &[String],
) -> Result<Vec<(String, Property)>> {
    if principal_key.is_empty() {
        return key_of(decl, principal);
    }
    principal_key
        .iter()
        .map(|property| {
            find_property(decl, principal, property)
                .map(|source| (property.clone(), source.clone()))
                .ok_or_else(|| {
                    Error::invalid_schema(format!(
                        "principal key property `{property}` is not declared on `{principal}`"
                    ))
                })
        })
        .collect()
}

/// A property visible on `entity`, searching base types.
fn find_property<'a>(decl: &'a ModelDecl, entity: &str, property: &str) -> Option<&'a Property> {
    let mut current = decl.entities.get(entity);
    while let Some(e) = current {
        if let Some(index) = e.property_index(property) {
            return Some(&e.properties[index]);
        }
        current = e.base.as_deref().and_then(|base| decl.entities.get(base));
    }
    None
}

fn ownership_depth(decl: &ModelDecl, name: &str) -> usize {
    let mut depth = 0;
    let mut current = name;
    while let Some(owner) = decl
        .entities
        .get(current)
        .and_then(|e| e.ownership.as_ref())
        .map(|o| o.owner.as_str())
    {
        depth += 1;
        current = owner;
        if depth > decl.entities.len() {
            break;
        }
    }
    depth
}

/// Gives every owned type a key derived from its owner's and the
/// relationship binding it to the owner.
fn owned_types(decl: &mut ModelDecl) -> Result<()> {
    let mut owned: Vec<String> = decl
        .entities
        .values()
        .filter(|e| e.ownership.is_some())
        .map(|e| e.name.clone())
        .collect();
    // Owners first, so nested owned types see their owner's key.
    owned.sort_by_key(|name| ownership_depth(decl, name));

    for name in owned {
        let entity = &decl.entities[&name];
        let Some(ownership) = entity.ownership.clone() else {
            continue;
        };

        if !decl.entities.contains_key(&ownership.owner) {
            return Err(Error::invalid_schema(format!(
                "owner `{}` of `{name}` is not declared",
                ownership.owner
            )));
        }

        let owner_key = key_of(decl, &ownership.owner)?;
        let owner_short = decl.entities[&ownership.owner].short_name().to_string();

        let foreign_key: Vec<(String, Property)> = owner_key
            .into_iter()
            .map(|(property, source)| (format!("{owner_short}{property}"), source))
            .collect();

        let entity = &mut decl.entities[&name];

        for (property, source) in &foreign_key {
            let property = entity.ensure_reference(property, source);
            property.nullable = false;
        }

        if entity.key.is_none() {
            let mut properties: Vec<String> =
                foreign_key.iter().map(|(name, _)| name.clone()).collect();

            if ownership.collection {
                let id = entity.ensure_property(OWNED_ID, Type::I32);
                id.nullable = false;
                if !id.value_generated_explicit {
                    id.value_generated = ValueGenerated::OnAdd;
                    id.value_generated_explicit = true;
                }
                properties.push(OWNED_ID.to_string());
            }

            debug!(owned = %name, key = ?properties, "owned type key");
            entity.key = Some(KeyDecl {
                properties,
                ..KeyDecl::default()
            });
        }

        if !entity.relationships.iter().any(|r| r.ownership) {
            entity.relationships.push(RelationshipDecl {
                principal: ownership.owner.clone(),
                navigation: None,
                inverse: Some(ownership.navigation.clone()),
                unique: !ownership.collection,
                foreign_key: foreign_key.into_iter().map(|(name, _)| name).collect(),
                principal_key: vec![],
                required: true,
                on_delete: Some(ReferentialAction::Cascade),
                name: None,
                ownership: true,
                annotations: Default::default(),
            });
        }
    }
    Ok(())
}

/// One side of a many-to-many relationship.
struct Side {
    entity: String,
    navigation: String,
    inverse: Option<String>,
}

/// Creates the join entity type of every many-to-many relationship that
/// does not name one, and the join type's keys and relationships.
fn join_entity_types(decl: &mut ModelDecl) -> Result<()> {
    let mut pairs = vec![];

    for entity in decl.entities.values() {
        for skip in &entity.skip_navigations {
            let Some(target) = decl.entities.get(&skip.target) else {
                return Err(Error::invalid_schema(format!(
                    "target `{}` of navigation `{}.{}` is not declared",
                    skip.target, entity.name, skip.navigation
                )));
            };

            let side = Side {
                entity: entity.name.clone(),
                navigation: skip.navigation.clone(),
                inverse: skip.inverse.clone(),
            };

            let inverse = skip.inverse.as_ref().and_then(|inverse| {
                target
                    .skip_navigations
                    .iter()
                    .find(|s| &s.navigation == inverse && s.target == entity.name)
            });

            match inverse {
                Some(inverse) => {
                    // Each pair is visited from both ends; keep one.
                    if (&entity.name, &skip.navigation) > (&target.name, &inverse.navigation) {
                        continue;
                    }
                    let other = Side {
                        entity: target.name.clone(),
                        navigation: inverse.navigation.clone(),
                        inverse: Some(skip.navigation.clone()),
                    };
                    let join = skip.join_entity.clone().or_else(|| inverse.join_entity.clone());
                    pairs.push((side, Some(other), skip.target.clone(), join));
                }
                None => {
                    let join = skip.join_entity.clone();
                    pairs.push((side, None, skip.target.clone(), join));
                }
            }
        }
    }

    for (side, other, target, join) in pairs {
        let join = match join {
            Some(join) => join,
            None => {
                let (a, b) = if side.entity <= target {
                    (&side.entity, &target)
                } else {
                    (&target, &side.entity)
                };
                format!("{a}{b}")
            }
        };

        // Foreign key to an entity type is named after the navigation
        // pointing to it, or after the type when there is none.
        let mut ends = vec![
            (
                side.entity.clone(),
                other.as_ref().map(|o| o.navigation.clone()),
            ),
            (target.clone(), Some(side.navigation.clone())),
        ];
        ends.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut key = vec![];
        let mut relationships = vec![];
        for (principal, navigation) in ends {
            let principal_key = key_of(decl, &principal)?;
            let prefix = match navigation {
                Some(navigation) => navigation,
                None => decl.entities[&principal].short_name().to_string(),
            };
            let properties: Vec<(String, Property)> = principal_key
                .into_iter()
                .map(|(property, source)| (format!("{prefix}{property}"), source))
                .collect();
            key.extend(properties.iter().map(|(name, _)| name.clone()));
            relationships.push((principal, properties));
        }

        let index = decl.entity_index(&join);
        let entity = &mut decl.entities[index];

        for (principal, properties) in relationships {
            let names: Vec<String> = properties.iter().map(|(name, _)| name.clone()).collect();
            let exists = entity.relationships.iter().any(|r| {
                r.principal == principal
                    && (r.foreign_key == names || (side.entity != target && !r.ownership))
            });
            if exists {
                continue;
            }
            for (name, source) in &properties {
                entity.ensure_reference(name, source).nullable = false;
            }
            entity.relationships.push(RelationshipDecl {
                principal,
                foreign_key: names,
                required: true,
                on_delete: Some(ReferentialAction::Cascade),
                ..RelationshipDecl::default()
            });
        }

        if entity.key.is_none() && !entity.keyless {
            debug!(join = %join, key = ?key, "join entity type");
            entity.key = Some(KeyDecl {
                properties: key,
                ..KeyDecl::default()
            });
        }

        let owner = &mut decl.entities[&side.entity];
        if let Some(skip) = owner
            .skip_navigations
            .iter_mut()
            .find(|s| s.navigation == side.navigation)
        {
            skip.join_entity = Some(join.clone());
        }
        if let (Some(other), Some(_)) = (&other, &side.inverse) {
            let inverse_owner = &mut decl.entities[&other.entity];
            if let Some(skip) = inverse_owner
                .skip_navigations
                .iter_mut()
                .find(|s| s.navigation == other.navigation)
            {
                skip.join_entity = Some(join.clone());
            }
        }
    }
    Ok(())
}

/// Adds the discriminator property and values of TPH hierarchies and checks
/// that strategies are declared consistently.
fn discriminators(decl: &mut ModelDecl) -> Result<()> {
    for entity in decl.entities.values() {
        let root = &decl.entities[root_name(decl, &entity.name)];
        let strategy = root.strategy.unwrap_or_default();

        if entity.base.is_some() {
            if let Some(declared) = entity.strategy {
                if declared != strategy {
                    return Err(Error::invalid_schema(format!(
                        "`{}` declares mapping strategy {} but its hierarchy uses {}",
                        entity.name,
                        declared.name(),
                        strategy.name()
                    )));
                }
            }
            if entity.discriminator.is_some() {
                return Err(Error::invalid_schema(format!(
                    "discriminator declared on derived type `{}`; declare it on `{}`",
                    entity.name, root.name
                )));
            }
        }

        if entity.base.is_none()
            && entity.discriminator.is_some()
            && strategy != MappingStrategy::Tph
        {
            return Err(Error::invalid_schema(format!(
                "`{}` declares a discriminator but is mapped with {}",
                entity.name,
                strategy.name()
            )));
        }
    }

    let roots: Vec<String> = decl
        .entities
        .values()
        .filter(|e| e.base.is_none() && e.strategy.unwrap_or_default() == MappingStrategy::Tph)
        .filter(|e| {
            e.discriminator.is_some()
                || decl
                    .entities
                    .values()
                    .any(|d| d.base.as_ref() == Some(&e.name))
        })
        .map(|e| e.name.clone())
        .collect();

    for root in roots {
        let members: Vec<String> = decl
            .entities
            .values()
            .filter(|e| root_name(decl, &e.name) == root)
            .map(|e| e.name.clone())
            .collect();

        let mut values: Vec<(String, Value)> = vec![];
        for member in &members {
            let entity = &mut decl.entities[member];
            if entity.discriminator_value.is_none() && !entity.is_abstract {
                entity.discriminator_value = Some(Value::from(entity.short_name()));
            }
            if let Some(value) = &entity.discriminator_value {
                if let Some((other, _)) = values.iter().find(|(_, v)| v == value) {
                    return Err(Error::invalid_schema(format!(
                        "`{other}` and `{member}` share the discriminator value `{value}`"
                    )));
                }
                values.push((member.clone(), value.clone()));
            }
        }

        let longest = values.iter().map(|(_, v)| v.text_len() as u64).max().unwrap_or(0);

        let entity = &mut decl.entities[&root];
        let name = entity
            .discriminator
            .get_or_insert_with(|| DISCRIMINATOR.to_string())
            .clone();
        let property = match entity.property_index(&name) {
            Some(index) => &mut entity.properties[index],
            None => {
                debug!(root = %root, property = %name, "discriminator property");
                let property = entity.ensure_property(&name, Type::String);
                property.nullable = false;
                property
            }
        };

        if property.ty.is_string() {
            match property.max_length {
                Some(max) if max < longest => {
                    return Err(Error::invalid_schema(format!(
                        "discriminator `{root}.{name}` has max length {max}, but the longest value needs {longest}"
                    )));
                }
                Some(_) => {}
                None => property.max_length = Some(longest),
            }
        }
    }
    Ok(())
}

/// Declares the foreign key properties of relationships that do not name
/// any: `{navigation or principal}{key property}`.
fn foreign_key_properties(decl: &mut ModelDecl) -> Result<()> {
    let mut pending = vec![];
    for (entity_index, entity) in decl.entities.values().enumerate() {
        for (index, relationship) in entity.relationships.iter().enumerate() {
            if !relationship.foreign_key.is_empty() {
                continue;
            }
            let Some(principal) = decl.entities.get(&relationship.principal) else {
                return Err(Error::invalid_schema(format!(
                    "principal `{}` of a relationship on `{}` is not declared",
                    relationship.principal, entity.name
                )));
            };
            let key = principal_key_of(decl, &principal.name, &relationship.principal_key)?;
            let prefix = relationship
                .navigation
                .clone()
                .unwrap_or_else(|| principal.short_name().to_string());
            let properties: Vec<(String, Property)> = key
                .into_iter()
                .map(|(property, source)| (format!("{prefix}{property}"), source))
                .collect();
            pending.push((entity_index, index, properties));
        }
    }

    for (entity_index, index, properties) in pending {
        let entity = &mut decl.entities[entity_index];
        let required = entity.relationships[index].required;
        for (name, source) in &properties {
            if entity.property_index(name).is_some() {
                continue;
            }
            entity.ensure_reference(name, source).nullable = !required;
        }
        debug!(
            entity = %entity.name,
            foreign_key = ?properties.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            "foreign key properties"
        );
        entity.relationships[index].foreign_key =
            properties.into_iter().map(|(name, _)| name).collect();
    }
    Ok(())
}

/// Indexes the foreign key properties of every relationship unless a key
/// or an existing index already starts with them.
fn foreign_key_indexes(decl: &mut ModelDecl) {
    let keys: Vec<Option<Vec<String>>> = decl
        .entities
        .values()
        .map(|e| {
            decl.entities[root_name(decl, &e.name)]
                .key
                .as_ref()
                .map(|k| k.properties.clone())
        })
        .collect();

    for (entity, key) in decl.entities.values_mut().zip(keys) {
        for index in 0..entity.relationships.len() {
            let relationship = &entity.relationships[index];
            let columns = &relationship.foreign_key;
            if columns.is_empty() {
                continue;
            }

            let covered = key
                .iter()
                .chain(entity.alternate_keys.iter().map(|k| &k.properties))
                .chain(entity.indexes.iter().map(|i| &i.properties))
                .any(|existing| existing.starts_with(columns));
            if covered {
                continue;
            }

            let unique = relationship.unique;
            let properties = columns.clone();
            debug!(entity = %entity.name, index = ?properties, unique, "foreign key index");
            entity.indexes.push(IndexDecl {
                properties,
                unique,
                ..IndexDecl::default()
            });
        }
    }
}
