use super::db::{ColumnId, StoreObjectId, Table, TableId};
use super::Schema;
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        debug_assert!(self.verify_ids_populated());

        for table in &self.schema.db.tables {
            self.verify_column_names_are_unique(table)?;
            self.verify_constraint_names_are_unique(table)?;
            self.verify_foreign_key_types(table)?;
        }
        Ok(())
    }

    fn verify_ids_populated(&self) -> bool {
        for (index, table) in self.schema.db.tables.iter().enumerate() {
            assert_eq!(table.id, TableId(index));

            for (index, column) in table.columns.iter().enumerate() {
                assert_ne!(column.id, ColumnId::placeholder());
                assert_eq!(column.id.store, StoreObjectId::Table(table.id));
                assert_eq!(column.id.index, index);
            }

            for (index, db_index) in table.indices.iter().enumerate() {
                assert_eq!(db_index.id.table, table.id);
                assert_eq!(db_index.id.index, index);
                assert!(!db_index.columns.is_empty());
            }

            if let Some(pk) = &table.primary_key {
                assert!(!pk.columns.is_empty());
            }
        }

        for (index, view) in self.schema.db.views.iter().enumerate() {
            assert_eq!(view.id.0, index);
        }

        for mapping in self.schema.mapping.entity_types.values() {
            for fragment in &mapping.fragments {
                for property in &fragment.properties {
                    assert_eq!(property.column.store, fragment.store);
                }
            }
        }

        true
    }

    fn verify_column_names_are_unique(&self, table: &Table) -> Result<()> {
        let mut names = HashSet::new();
        for column in &table.columns {
            if !names.insert(column.name.as_str()) {
                return Err(Error::invalid_schema(format!(
                    "duplicate column `{}` in table `{}`",
                    column.name, table.name
                )));
            }
        }
        Ok(())
    }

    /// Keys, unique constraints, indexes and foreign keys share one
    /// namespace per table.
    fn verify_constraint_names_are_unique(&self, table: &Table) -> Result<()> {
        let names = table
            .primary_key
            .iter()
            .map(|pk| &pk.name)
            .chain(table.unique_constraints.iter().map(|u| &u.name))
            .chain(table.indices.iter().map(|i| &i.name))
            .chain(table.foreign_keys.iter().map(|fk| &fk.name))
            .chain(table.check_constraints.iter().map(|c| &c.name));

        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(Error::invalid_schema(format!(
                    "name `{name}` is used by more than one constraint or index in table `{}`",
                    table.name
                )));
            }
        }
        Ok(())
    }

    fn verify_foreign_key_types(&self, table: &Table) -> Result<()> {
        let db = &self.schema.db;

        for fk in &table.foreign_keys {
            assert_eq!(fk.columns.len(), fk.principal_columns.len());

            for (column, principal_column) in fk.columns.iter().zip(&fk.principal_columns) {
                let column = db.column(*column);
                let principal_column = db.column(*principal_column);

                if column.ty != principal_column.ty {
                    return Err(Error::invalid_schema(format!(
                        "foreign key `{}` maps `{}.{}` ({}) to `{}.{}` ({}); the types must match",
                        fk.name,
                        table.name,
                        column.name,
                        column.ty,
                        db.table(fk.principal).name,
                        principal_column.name,
                        principal_column.ty
                    )));
                }
            }
        }
        Ok(())
    }
}
