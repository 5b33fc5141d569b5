use super::Operation;

use strata_core::schema::db::{Index, Table};
use strata_core::schema::{Annotations, ObjectName};

/// Creates an index.
#[derive(Debug, Clone, PartialEq)]
pub struct AddIndex {
    pub table: ObjectName,
    pub name: String,
    pub columns: Vec<IndexColumnDef>,
    pub unique: bool,

    /// Partial index predicate
    pub filter: Option<String>,

    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumnDef {
    pub name: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropIndex {
    pub table: ObjectName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameIndex {
    pub table: ObjectName,
    pub name: String,
    pub new_name: String,
}

impl Operation {
    pub fn add_index(table: &Table, index: &Index) -> Self {
        AddIndex {
            table: table.name.clone(),
            name: index.name.clone(),
            columns: index
                .columns
                .iter()
                .map(|column| IndexColumnDef {
                    name: table.column(column.column).name.clone(),
                    descending: column.descending,
                })
                .collect(),
            unique: index.unique,
            filter: index.filter.clone(),
            annotations: index.annotations.clone(),
        }
        .into()
    }

    pub fn drop_index(table: &Table, index: &Index) -> Self {
        DropIndex {
            table: table.name.clone(),
            name: index.name.clone(),
        }
        .into()
    }

    pub fn rename_index(table: &Table, from: &Index, to: &Index) -> Self {
        RenameIndex {
            table: table.name.clone(),
            name: from.name.clone(),
            new_name: to.name.clone(),
        }
        .into()
    }
}

impl From<AddIndex> for Operation {
    fn from(value: AddIndex) -> Self {
        Self::AddIndex(value)
    }
}

impl From<DropIndex> for Operation {
    fn from(value: DropIndex) -> Self {
        Self::DropIndex(value)
    }
}

impl From<RenameIndex> for Operation {
    fn from(value: RenameIndex) -> Self {
        Self::RenameIndex(value)
    }
}
