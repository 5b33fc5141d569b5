use super::Operation;

use strata_core::schema::db::{ColumnId, Row, Table};
use strata_core::schema::{ObjectName, Value};

/// Inserts a seed row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertData {
    pub table: ObjectName,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

/// Changes the seed row identified by its key values.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateData {
    pub table: ObjectName,
    pub key_columns: Vec<String>,
    pub key_values: Vec<Value>,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

/// Deletes the seed row identified by its key values.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteData {
    pub table: ObjectName,
    pub key_columns: Vec<String>,
    pub key_values: Vec<Value>,
}

impl Operation {
    pub fn insert_data(table: &Table, row: &Row) -> Self {
        let (columns, values) = named(table, row.values.iter().map(|(c, v)| (*c, v)));
        InsertData {
            table: table.name.clone(),
            columns,
            values,
        }
        .into()
    }

    /// Sets `columns` of the stored row sharing `row`'s key to the values
    /// `row` holds.
    pub fn update_data(table: &Table, row: &Row, columns: &[ColumnId]) -> Self {
        let (key_columns, key_values) = key_of(table, row);
        let (columns, values) = named(
            table,
            columns.iter().map(|column| {
                (*column, row.get(*column).unwrap_or(&Value::Null))
            }),
        );
        UpdateData {
            table: table.name.clone(),
            key_columns,
            key_values,
            columns,
            values,
        }
        .into()
    }

    pub fn delete_data(table: &Table, row: &Row) -> Self {
        let (key_columns, key_values) = key_of(table, row);
        DeleteData {
            table: table.name.clone(),
            key_columns,
            key_values,
        }
        .into()
    }
}

fn named<'a>(
    table: &Table,
    values: impl Iterator<Item = (ColumnId, &'a Value)>,
) -> (Vec<String>, Vec<Value>) {
    values
        .map(|(column, value)| (table.column(column).name.clone(), value.clone()))
        .unzip()
}

fn key_of(table: &Table, row: &Row) -> (Vec<String>, Vec<Value>) {
    let key = table
        .primary_key
        .as_ref()
        .map(|pk| pk.columns.as_slice())
        .unwrap_or_default();
    named(
        table,
        key.iter()
            .map(|column| (*column, row.get(*column).unwrap_or(&Value::Null))),
    )
}

impl From<InsertData> for Operation {
    fn from(value: InsertData) -> Self {
        Self::InsertData(value)
    }
}

impl From<UpdateData> for Operation {
    fn from(value: UpdateData) -> Self {
        Self::UpdateData(value)
    }
}

impl From<DeleteData> for Operation {
    fn from(value: DeleteData) -> Self {
        Self::DeleteData(value)
    }
}
