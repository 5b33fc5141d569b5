use super::BuildSchema;
use crate::schema::app::{EntityTypeId, MappingStrategy, SeedRow};
use crate::schema::db::{ColumnId, Row, TableId};
use crate::schema::Value;
use crate::{Error, Result};

use tracing::debug;

impl BuildSchema<'_> {
    /// Spreads every seed row over the tables its entity type is stored in.
    /// Rows of different types sharing a table and a key value merge into
    /// one row.
    pub(super) fn build_data(&mut self) -> Result<()> {
        let app = self.app;

        for id in app.canonical_order() {
            let entity = app.entity_type(id);
            if entity.data.is_empty() {
                continue;
            }

            let tables = self.seed_tables(id);
            if tables.is_empty() {
                return Err(Error::invalid_schema(format!(
                    "`{}` has seed data but is not stored in a table",
                    entity.name
                )));
            }

            for row in &entity.data {
                let row = self.with_discriminator(id, row);
                for &table in &tables {
                    let values: Vec<(ColumnId, Value)> = row
                        .values
                        .iter()
                        .filter_map(|(property, value)| {
                            Some((self.column_of(id, table, *property)?, value.clone()))
                        })
                        .collect();
                    self.add_row(&entity.name, table, values)?;
                }
            }

            debug!(entity = %entity.name, rows = entity.data.len(), "seed data");
        }
        Ok(())
    }

    /// Tables holding a row of `id`: the tables of every type in its
    /// ancestry, except under TPC where a row lives in its own table only.
    fn seed_tables(&self, id: EntityTypeId) -> Vec<TableId> {
        let app = self.app;
        if app.in_json(id) {
            return vec![];
        }
        let holders: Vec<EntityTypeId> =
            if app.entity_type(id).is_owned() || app.strategy_of(id) == MappingStrategy::Tpc {
                vec![id]
            } else {
                app.ancestry(id).into_iter().map(|e| e.id).collect()
            };

        let mut tables = vec![];
        for holder in holders {
            let Some(mapping) = self.mapping.entity_types.get(&holder) else {
                continue;
            };
            for table in mapping.tables() {
                if !tables.contains(&table) {
                    tables.push(table);
                }
            }
        }
        tables
    }

    /// TPH rows carry their type's discriminator value.
    fn with_discriminator(&self, id: EntityTypeId, row: &SeedRow) -> SeedRow {
        let app = self.app;
        let mut row = row.clone();
        let discriminator = app.root_of(id).discriminator;
        let value = &app.entity_type(id).discriminator_value;
        if let (Some(property), Some(value)) = (discriminator, value) {
            if row.get(property).is_none() {
                row.values.push((property, value.clone()));
            }
        }
        row
    }

    fn add_row(&mut self, entity: &str, table: TableId, mut values: Vec<(ColumnId, Value)>) -> Result<()> {
        let table = &mut self.tables[table.0];
        let key = table
            .primary_key
            .as_ref()
            .map(|pk| pk.columns.clone())
            .unwrap_or_default();

        values.sort_by_key(|(column, _)| column.index);
        let row = Row { values };

        let key_values = match row.values_of(&key) {
            Some(values) if !key.is_empty() => values,
            _ => {
                return Err(Error::invalid_schema(format!(
                    "a seed row of `{entity}` does not set every key column of table `{}`",
                    table.name
                )));
            }
        };
        if key_values.iter().any(|value| value.is_null()) {
            return Err(Error::invalid_schema(format!(
                "a seed row of `{entity}` has a null key value in table `{}`",
                table.name
            )));
        }

        let existing = table
            .data
            .iter()
            .position(|other| other.values_of(&key).as_ref() == Some(&key_values));
        let Some(existing) = existing else {
            table.data.push(row);
            return Ok(());
        };

        for (column, value) in row.values {
            if let Some(current) = table.data[existing].get(column) {
                if *current != value {
                    return Err(Error::invalid_schema(format!(
                        "seed rows of `{entity}` set column `{}` of table `{}` to both {current} and {value}",
                        table.columns[column.index].name, table.name
                    )));
                }
                continue;
            }
            let merged = &mut table.data[existing];
            merged.values.push((column, value));
            merged.values.sort_by_key(|(column, _)| column.index);
        }
        Ok(())
    }
}
