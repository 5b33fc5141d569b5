use crate::operation::{AddForeignKey, CreateTable, Operation};

use strata_core::schema::db::{Schema, Table, TableId};

use std::collections::HashSet;
use tracing::debug;

/// Operations grouped by kind. Concatenating the groups in declaration
/// order yields an order every store can run top to bottom.
#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub(crate) drop_foreign_keys: Vec<Operation>,
    pub(crate) drop_tables: Vec<Operation>,
    pub(crate) drop_indices: Vec<Operation>,
    pub(crate) drop_primary_keys: Vec<Operation>,
    pub(crate) drop_unique_constraints: Vec<Operation>,
    pub(crate) drop_check_constraints: Vec<Operation>,
    pub(crate) drop_triggers: Vec<Operation>,
    pub(crate) drop_sequences: Vec<Operation>,
    pub(crate) drop_views: Vec<Operation>,
    pub(crate) drop_functions: Vec<Operation>,
    pub(crate) drop_procedures: Vec<Operation>,

    /// Seed rows leave before their columns do
    pub(crate) delete_data: Vec<Operation>,

    pub(crate) drop_columns: Vec<Operation>,
    pub(crate) ensure_schemas: Vec<Operation>,
    pub(crate) rename_tables: Vec<Operation>,
    pub(crate) rename_columns: Vec<Operation>,
    pub(crate) rename_indices: Vec<Operation>,
    pub(crate) rename_sequences: Vec<Operation>,
    pub(crate) alter_database: Vec<Operation>,
    pub(crate) create_sequences: Vec<Operation>,
    pub(crate) alter_tables: Vec<Operation>,
    pub(crate) columns: Vec<Operation>,

    /// Added or altered computed columns; they may read any other column
    pub(crate) computed_columns: Vec<Operation>,

    pub(crate) add_primary_keys: Vec<Operation>,
    pub(crate) add_unique_constraints: Vec<Operation>,
    pub(crate) alter_sequences: Vec<Operation>,
    pub(crate) create_tables: Vec<Operation>,
    pub(crate) create_views: Vec<Operation>,
    pub(crate) create_functions: Vec<Operation>,
    pub(crate) create_procedures: Vec<Operation>,

    /// Seed rows arrive once every column exists and before the
    /// constraints that could reject them
    pub(crate) insert_data: Vec<Operation>,

    pub(crate) add_foreign_keys: Vec<Operation>,
    pub(crate) add_indices: Vec<Operation>,
    pub(crate) add_check_constraints: Vec<Operation>,
    pub(crate) add_triggers: Vec<Operation>,
}

impl Plan {
    pub(crate) fn into_operations(self) -> Vec<Operation> {
        [
            self.drop_foreign_keys,
            self.drop_tables,
            self.drop_indices,
            self.drop_primary_keys,
            self.drop_unique_constraints,
            self.drop_check_constraints,
            self.drop_triggers,
            self.drop_sequences,
            self.drop_views,
            self.drop_functions,
            self.drop_procedures,
            self.delete_data,
            self.drop_columns,
            self.ensure_schemas,
            self.rename_tables,
            self.rename_columns,
            self.rename_indices,
            self.rename_sequences,
            self.alter_database,
            self.create_sequences,
            self.alter_tables,
            self.columns,
            self.computed_columns,
            self.add_primary_keys,
            self.add_unique_constraints,
            self.alter_sequences,
            self.create_tables,
            self.create_views,
            self.create_functions,
            self.create_procedures,
            self.insert_data,
            self.add_foreign_keys,
            self.add_indices,
            self.add_check_constraints,
            self.add_triggers,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Creates `tables` of `schema` principals first.
    ///
    /// A foreign key is created inline when its principal already exists or
    /// is created earlier; the rest, which only happens for cycles, are
    /// added once every table exists.
    pub(crate) fn create_tables(&mut self, schema: &Schema, tables: &[&Table]) {
        let new: HashSet<TableId> = tables.iter().map(|table| table.id).collect();
        let mut pending: Vec<&Table> = tables.to_vec();
        let mut created = HashSet::new();

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                table.foreign_keys.iter().all(|fk| {
                    fk.principal == table.id
                        || !new.contains(&fk.principal)
                        || created.contains(&fk.principal)
                })
            });
            let index = ready.unwrap_or_else(|| {
                debug!(table = %pending[0].name, "foreign key cycle; deferring constraints");
                0
            });
            let table = pending.remove(index);
            created.insert(table.id);

            let mut create = CreateTable::new(schema, table);
            let mut inline = Vec::with_capacity(create.foreign_keys.len());
            for (fk, def) in table.foreign_keys.iter().zip(create.foreign_keys.drain(..)) {
                if !new.contains(&fk.principal) || created.contains(&fk.principal) {
                    inline.push(def);
                } else {
                    self.add_foreign_keys
                        .push(AddForeignKey { foreign_key: def }.into());
                }
            }
            create.foreign_keys = inline;
            self.create_tables.push(create.into());

            for row in &table.data {
                self.insert_data.push(Operation::insert_data(table, row));
            }
        }
    }

    /// Drops `tables` dependents first. Foreign keys closing a cycle are
    /// dropped before any table.
    pub(crate) fn drop_tables(&mut self, tables: &[&Table]) {
        let mut pending: Vec<&Table> = tables.to_vec();
        // (table, index of foreign key) already dropped
        let mut released: HashSet<(TableId, usize)> = HashSet::new();

        let references = |pending: &[&Table], released: &HashSet<(TableId, usize)>, target: TableId| {
            pending.iter().any(|table| {
                table.id != target
                    && table.foreign_keys.iter().enumerate().any(|(index, fk)| {
                        fk.principal == target && !released.contains(&(table.id, index))
                    })
            })
        };

        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|table| !references(&pending, &released, table.id));

            let index = match ready {
                Some(index) => index,
                None => {
                    let target = pending[0].id;
                    debug!(table = %pending[0].name, "foreign key cycle; dropping constraints first");
                    for table in &pending[1..] {
                        for (index, fk) in table.foreign_keys.iter().enumerate() {
                            if fk.principal == target && released.insert((table.id, index)) {
                                self.drop_foreign_keys.push(Operation::drop_foreign_key(table, fk));
                            }
                        }
                    }
                    0
                }
            };

            let table = pending.remove(index);
            self.drop_tables.push(Operation::drop_table(table));
        }
    }
}
