use super::{tpc, tph, tpt, BuildSchema};
use crate::schema::app::{
    EntityType, EntityTypeId, MappingStrategy, Ownership, StoreObjectKind, TableMapping,
};
use crate::schema::db::{self, TableId};
use crate::schema::ObjectName;
use crate::{Error, Result};

use tracing::debug;

impl BuildSchema<'_> {
    /// Resolves the main table of every entity type and creates the table
    /// shells. Columns are filled in later.
    pub(super) fn build_table_stubs(&mut self) -> Result<()> {
        let app = self.app;

        for id in app.canonical_order() {
            let entity = app.entity_type(id);
            self.mapping.entity_type_mut(id);

            let name = match &entity.ownership {
                Some(ownership) => self.owned_table_name(entity, ownership),
                None => match app.strategy_of(id) {
                    MappingStrategy::Tph => tph::table_name(self, entity)?,
                    MappingStrategy::Tpt => tpt::table_name(self, entity),
                    MappingStrategy::Tpc => tpc::table_name(self, entity),
                },
            };

            let table = match name {
                Some(name) => {
                    self.verify_has_key(entity, &name)?;
                    Some(self.table_stub(name, entity))
                }
                None => None,
            };
            self.targets.insert(id, table);

            for fragment in &entity.fragments {
                if fragment.kind != StoreObjectKind::Table {
                    continue;
                }

                if table.is_none() {
                    return Err(Error::invalid_schema(format!(
                        "`{}` is split to table `{}` but has no main table",
                        entity.name, fragment.name
                    )));
                }

                let name = self.qualify(&fragment.name);
                if self.table_lookup.contains_key(&name) {
                    return Err(Error::invalid_schema(format!(
                        "split fragment `{name}` of `{}` targets a table that is already mapped",
                        entity.name
                    )));
                }
                self.table_stub(name, entity);
            }
        }

        Ok(())
    }

    /// Name of the table an entity type maps to when it does not inherit
    /// one: the declared table, or the entity name.
    pub(super) fn default_table_name(&self, entity: &EntityType) -> Option<ObjectName> {
        match &entity.table {
            TableMapping::Table(name) => Some(self.qualify(name)),
            TableMapping::None => None,
            // Mapped to a view or function only
            TableMapping::Default if entity.view.is_some() || entity.function.is_some() => None,
            TableMapping::Default => Some(self.qualify(&ObjectName::new(&entity.name))),
        }
    }

    fn owned_table_name(&self, entity: &EntityType, ownership: &Ownership) -> Option<ObjectName> {
        if self.app.in_json(entity.id) {
            return None;
        }

        match &entity.table {
            TableMapping::Table(name) => Some(self.qualify(name)),
            TableMapping::None => None,
            TableMapping::Default => {
                let owner_table = self.targets.get(&ownership.owner).copied().flatten()?;
                let owner_table = &self.tables[owner_table.0].name;

                if ownership.collection {
                    let owner = self.app.entity_type(ownership.owner);
                    Some(ObjectName {
                        schema: owner_table.schema.clone(),
                        name: format!("{}{}", owner.short_name(), ownership.navigation),
                    })
                } else {
                    Some(owner_table.clone())
                }
            }
        }
    }

    fn verify_has_key(&self, entity: &EntityType, table: &ObjectName) -> Result<()> {
        if self.app.primary_key_of(entity.id).is_some() {
            return Ok(());
        }

        if self.app.root_of(entity.id).keyless {
            Err(Error::invalid_schema(format!(
                "keyless entity type `{}` cannot be mapped to table `{table}`; map it to a view \
                 or function instead",
                entity.name
            )))
        } else {
            Err(Error::invalid_schema(format!(
                "`{}` is mapped to table `{table}` but has no key",
                entity.name
            )))
        }
    }

    /// Returns the table named `name`, creating it on first use, and records
    /// that `entity` is stored in it.
    pub(super) fn table_stub(&mut self, name: ObjectName, entity: &EntityType) -> TableId {
        let id = match self.table_lookup.get(&name) {
            Some(id) => *id,
            None => {
                let id = TableId(self.tables.len());
                debug!(table = %name, entity = %entity.name, "creating table");
                self.table_lookup.insert(name.clone(), id);
                self.tables.push(db::Table::new(id, name));
                self.contributions.push(vec![]);
                id
            }
        };

        let table = &mut self.tables[id.0];
        if !table.entity_types.contains(&entity.name) {
            table.entity_types.push(entity.name.clone());
        }

        self.mapping.entity_type_mut(entity.id).fragment_mut(id.into());
        id
    }

    /// Independent entity types stored in one table must share rows through
    /// a one-to-one relationship on their primary keys. Types of one
    /// hierarchy, and owned types living in their owner's table, are a
    /// single group.
    pub(super) fn verify_table_sharing(&self) -> Result<()> {
        for table in &self.tables {
            let mut groups = vec![];
            for (id, target) in &self.targets {
                if *target != Some(table.id) {
                    continue;
                }
                let group = self.sharing_group(*id);
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }

            if groups.len() < 2 {
                continue;
            }

            for &group in &groups {
                let linked = groups.iter().any(|&other| {
                    other != group && (self.shares_rows(group, other) || self.shares_rows(other, group))
                });

                if !linked {
                    let other = groups.iter().find(|&&other| other != group).copied();
                    let other = other.map(|id| self.app.entity_type(id).name.as_str());
                    return Err(Error::invalid_schema(format!(
                        "`{}` and `{}` share table `{}` but are not linked by a one-to-one \
                         relationship on their primary keys",
                        self.app.entity_type(group).name,
                        other.unwrap_or_default(),
                        table.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn sharing_group(&self, id: EntityTypeId) -> EntityTypeId {
        let entity = self.app.entity_type(id);
        if let Some(ownership) = &entity.ownership {
            if self.targets.get(&ownership.owner) == self.targets.get(&id) {
                return self.sharing_group(ownership.owner);
            }
        }
        self.app.root_of(id).id
    }

    /// `true` when a type of `dependent`'s group references `principal`'s
    /// group through a unique foreign key on its primary key.
    fn shares_rows(&self, dependent: EntityTypeId, principal: EntityTypeId) -> bool {
        let Some(key) = self.app.primary_key_of(dependent) else {
            return false;
        };

        self.app
            .descendants(dependent)
            .into_iter()
            .flat_map(|entity| &entity.foreign_keys)
            .any(|fk| {
                fk.unique
                    && !fk.is_ownership
                    && fk.properties == key.properties
                    && self.sharing_group(fk.principal) == principal
            })
    }
}
