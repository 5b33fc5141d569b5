use super::BuildSchema;
use crate::schema::app::{EntityTypeId, MappingStrategy, PropertyId, ReferentialAction, StoreObjectKind};
use crate::schema::db::{
    self, ColumnId, IndexColumn, IndexId, PrimaryKey, TableId, UniqueConstraint,
};
use crate::schema::Annotations;
use crate::Result;

use tracing::debug;

impl BuildSchema<'_> {
    /// The first entity type stored in a table, in canonical order, gives
    /// the table its primary key.
    pub(super) fn build_primary_keys(&mut self) {
        let app = self.app;

        for index in 0..self.tables.len() {
            let table = TableId(index);
            let owner = self
                .mapping
                .entity_types
                .values()
                .find(|m| m.fragment(table.into()).is_some())
                .map(|m| m.id);
            let Some(owner) = owner else {
                continue;
            };
            let Some(key) = app.primary_key_of(owner) else {
                continue;
            };
            let Some(columns) = self.columns_of(owner, table, &key.properties) else {
                debug!(table = %self.tables[index].name, "key columns not stored in table");
                continue;
            };

            let root = app.root_of(owner);
            let declared_here = self.targets.get(&root.id).copied().flatten() == Some(table);
            let name = match &key.name {
                Some(name) if declared_here => name.clone(),
                _ => {
                    let generated = format!("PK_{}", self.tables[index].name.name);
                    self.identifier(generated)
                }
            };

            self.tables[index].primary_key = Some(PrimaryKey {
                name,
                columns,
                annotations: key.annotations.clone(),
            });
        }
    }

    pub(super) fn build_unique_constraints(&mut self) -> Result<()> {
        let app = self.app;

        for id in app.canonical_order() {
            for key in &app.entity_type(id).alternate_keys {
                for (owner, table) in self.row_tables(id) {
                    let Some(columns) = self.columns_of(owner, table, &key.properties) else {
                        continue;
                    };
                    self.add_unique_constraint(table, columns, key.name.clone(), &key.annotations)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn build_indices(&mut self) -> Result<()> {
        let app = self.app;

        for id in app.canonical_order() {
            for index in &app.entity_type(id).indexes {
                for (owner, table) in self.row_tables(id) {
                    let Some(columns) = self.columns_of(owner, table, &index.properties) else {
                        continue;
                    };
                    let columns: Vec<_> = columns
                        .iter()
                        .enumerate()
                        .map(|(position, column)| IndexColumn {
                            column: *column,
                            descending: index.descending.get(position).copied().unwrap_or(false),
                        })
                        .collect();

                    let existing: Vec<_> = self.tables[table.0]
                        .indices
                        .iter()
                        .map(|i| {
                            let same = i.columns == columns
                                && i.unique == index.unique
                                && i.filter == index.filter;
                            (i.name.clone(), same)
                        })
                        .collect();
                    let column_ids: Vec<_> = columns.iter().map(|c| c.column).collect();
                    let generated = self.generated_name("IX", table, None, &column_ids);
                    let Some(name) =
                        self.constraint_name("index", table, index.name.clone(), generated, &existing)?
                    else {
                        continue;
                    };

                    let table = &mut self.tables[table.0];
                    debug!(table = %table.name, index = %name, "adding index");
                    table.indices.push(db::Index {
                        id: IndexId {
                            table: table.id,
                            index: table.indices.len(),
                        },
                        name,
                        on: table.id,
                        columns,
                        unique: index.unique,
                        filter: index.filter.clone(),
                        annotations: index.annotations.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub(super) fn build_foreign_keys(&mut self) -> Result<()> {
        let app = self.app;

        for id in app.canonical_order() {
            let entity = app.entity_type(id);
            let main = self.targets.get(&id).copied().flatten();

            // A TPT derived row extends its base row
            if let (Some(base), Some(table), false) = (entity.base, main, entity.is_owned()) {
                if app.strategy_of(id) == MappingStrategy::Tpt {
                    if let Some(base_table) = self.targets.get(&base).copied().flatten() {
                        self.link_rows(table, base_table)?;
                    }
                }
            }

            // Table splitting
            if let Some(table) = main {
                for fragment in &entity.fragments {
                    if fragment.kind == StoreObjectKind::Table {
                        let fragment_table = self.table_lookup[&self.qualify(&fragment.name)];
                        self.link_rows(fragment_table, table)?;
                    }
                }
            }

            for fk in &entity.foreign_keys {
                let Some(principal_table) = self.targets.get(&fk.principal).copied().flatten() else {
                    debug!(
                        entity = %entity.name,
                        principal = %app.entity_type(fk.principal).name,
                        "principal is not stored in a table; no foreign key constraint"
                    );
                    continue;
                };
                let Some(principal_columns) =
                    self.columns_of(fk.principal, principal_table, &fk.principal_key)
                else {
                    continue;
                };

                for (owner, table) in self.row_tables(id) {
                    let Some(columns) = self.columns_of(owner, table, &fk.properties) else {
                        continue;
                    };

                    // Rows shared through the primary key need no constraint
                    if table == principal_table && columns == principal_columns {
                        continue;
                    }

                    self.ensure_principal_key(principal_table, &principal_columns)?;
                    self.add_foreign_key(
                        table,
                        columns,
                        principal_table,
                        principal_columns.clone(),
                        fk.on_delete,
                        fk.name.clone(),
                        &fk.annotations,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Check constraints, triggers, comments, annotations and migration
    /// exclusion, from entity types and their split fragments.
    pub(super) fn build_table_facets(&mut self) {
        let app = self.app;

        for id in app.canonical_order() {
            let entity = app.entity_type(id);

            if let Some(table) = self.targets.get(&id).copied().flatten() {
                let table = &mut self.tables[table.0];
                add_checks_and_triggers(table, &entity.check_constraints, &entity.triggers);
                if table.comment.is_none() {
                    table.comment = entity.comment.clone();
                }
                table.excluded_from_migrations |= entity.excluded_from_migrations;
                table.annotations.extend(&entity.annotations);
            }

            for fragment in &entity.fragments {
                if fragment.kind != StoreObjectKind::Table {
                    continue;
                }
                let table = self.table_lookup[&self.qualify(&fragment.name)];
                let table = &mut self.tables[table.0];
                add_checks_and_triggers(table, &fragment.check_constraints, &fragment.triggers);
                if table.comment.is_none() {
                    table.comment = fragment.comment.clone();
                }
                table.excluded_from_migrations |= fragment.excluded_from_migrations;
            }
        }
    }

    /// Tables holding rows of `id`, each with the entity type whose
    /// placement stored the columns there. A TPC type's rows live in the
    /// tables of its concrete descendants.
    fn row_tables(&self, id: EntityTypeId) -> Vec<(EntityTypeId, TableId)> {
        let app = self.app;
        let entity = app.entity_type(id);

        if !entity.is_owned() && app.strategy_of(id) == MappingStrategy::Tpc {
            return app
                .descendants(id)
                .into_iter()
                .filter_map(|d| Some((d.id, self.targets.get(&d.id).copied().flatten()?)))
                .collect();
        }

        self.mapping
            .entity_type(id)
            .tables()
            .map(|table| (id, table))
            .collect()
    }

    /// Columns storing `properties` of `entity` in `table`, or `None` when
    /// any of them is stored elsewhere.
    fn columns_of(
        &self,
        entity: EntityTypeId,
        table: TableId,
        properties: &[PropertyId],
    ) -> Option<Vec<ColumnId>> {
        properties
            .iter()
            .map(|property| self.column_of(entity, table, *property))
            .collect()
    }

    /// Inherited properties are found in the mapping of the type that
    /// placed them.
    pub(super) fn column_of(&self, entity: EntityTypeId, table: TableId, property: PropertyId) -> Option<ColumnId> {
        self.app
            .ancestry(entity)
            .into_iter()
            .rev()
            .find_map(|e| self.mapping.entity_type(e.id).column(table.into(), property))
    }

    /// One-to-one cascade foreign key from `dependent`'s primary key to
    /// `principal`'s.
    fn link_rows(&mut self, dependent: TableId, principal: TableId) -> Result<()> {
        let key_columns = |table: TableId| {
            self.tables[table.0]
                .primary_key
                .as_ref()
                .map(|pk| pk.columns.clone())
        };
        let (Some(columns), Some(principal_columns)) = (key_columns(dependent), key_columns(principal)) else {
            return Ok(());
        };

        self.add_foreign_key(
            dependent,
            columns,
            principal,
            principal_columns,
            ReferentialAction::Cascade,
            None,
            &Annotations::new(),
        )
    }

    /// A foreign key must reference the primary key or a unique constraint.
    fn ensure_principal_key(&mut self, table: TableId, columns: &[ColumnId]) -> Result<()> {
        let principal = &self.tables[table.0];
        let is_primary_key = principal
            .primary_key
            .as_ref()
            .is_some_and(|pk| pk.columns == columns);
        let is_unique = principal
            .unique_constraints
            .iter()
            .any(|u| u.columns == columns);

        if !is_primary_key && !is_unique {
            self.add_unique_constraint(table, columns.to_vec(), None, &Annotations::new())?;
        }
        Ok(())
    }

    fn add_unique_constraint(
        &mut self,
        table: TableId,
        columns: Vec<ColumnId>,
        name: Option<String>,
        annotations: &Annotations,
    ) -> Result<()> {
        let existing: Vec<_> = self.tables[table.0]
            .unique_constraints
            .iter()
            .map(|u| (u.name.clone(), u.columns == columns))
            .collect();
        let generated = self.generated_name("AK", table, None, &columns);
        let Some(name) = self.constraint_name("unique constraint", table, name, generated, &existing)? else {
            return Ok(());
        };

        let table = &mut self.tables[table.0];
        debug!(table = %table.name, constraint = %name, "adding unique constraint");
        table.unique_constraints.push(UniqueConstraint {
            name,
            columns,
            annotations: annotations.clone(),
        });
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn add_foreign_key(
        &mut self,
        table: TableId,
        columns: Vec<ColumnId>,
        principal: TableId,
        principal_columns: Vec<ColumnId>,
        on_delete: ReferentialAction,
        name: Option<String>,
        annotations: &Annotations,
    ) -> Result<()> {
        let existing: Vec<_> = self.tables[table.0]
            .foreign_keys
            .iter()
            .map(|fk| {
                let same = fk.columns == columns
                    && fk.principal == principal
                    && fk.principal_columns == principal_columns
                    && fk.on_delete == on_delete;
                (fk.name.clone(), same)
            })
            .collect();
        let generated = self.generated_name("FK", table, Some(principal), &columns);
        let Some(name) = self.constraint_name("foreign key", table, name, generated, &existing)? else {
            return Ok(());
        };

        let table = &mut self.tables[table.0];
        debug!(table = %table.name, foreign_key = %name, "adding foreign key");
        table.foreign_keys.push(db::ForeignKey {
            name,
            columns,
            principal,
            principal_columns,
            on_delete,
            annotations: annotations.clone(),
        });
        Ok(())
    }

    /// `{prefix}_{Table}[_{Principal}]_{Columns}`
    fn generated_name(
        &self,
        prefix: &str,
        table: TableId,
        principal: Option<TableId>,
        columns: &[ColumnId],
    ) -> String {
        let table = &self.tables[table.0];
        let mut name = format!("{prefix}_{}", table.name.name);
        if let Some(principal) = principal {
            name.push('_');
            name.push_str(&self.tables[principal.0].name.name);
        }
        for column in table.column_names(columns) {
            name.push('_');
            name.push_str(column);
        }
        name
    }
}

fn add_checks_and_triggers(
    table: &mut db::Table,
    checks: &[crate::schema::app::CheckConstraint],
    triggers: &[crate::schema::app::Trigger],
) {
    for check in checks {
        if !table.check_constraints.iter().any(|c| c.name == check.name) {
            table.check_constraints.push(db::CheckConstraint {
                name: check.name.clone(),
                sql: check.sql.clone(),
            });
        }
    }

    for trigger in triggers {
        if !table.triggers.iter().any(|t| t.name == trigger.name) {
            table.triggers.push(db::Trigger {
                name: trigger.name.clone(),
            });
        }
    }
}
