use super::{ColumnDef, ForeignKeyDef, KeyDef, Operation};

use strata_core::schema::db::{CheckConstraint, Schema, Table};
use strata_core::schema::{Annotations, ObjectName};

/// Creates a table with its columns and constraints.
///
/// Indexes and triggers are added by separate operations once every table
/// exists.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: ObjectName,

    pub columns: Vec<ColumnDef>,

    pub primary_key: Option<KeyDef>,

    pub unique_constraints: Vec<KeyDef>,

    /// Constraints whose principal exists when the table is created
    pub foreign_keys: Vec<ForeignKeyDef>,

    pub check_constraints: Vec<CheckConstraint>,

    pub comment: Option<String>,

    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub name: ObjectName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameTable {
    pub name: ObjectName,
    pub new_name: ObjectName,
}

/// Changes a table's comment or annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub name: ObjectName,
    pub comment: Option<String>,
    pub old_comment: Option<String>,
    pub annotations: Annotations,
    pub old_annotations: Annotations,
}

impl CreateTable {
    /// `schema` is the model `table` belongs to.
    pub fn new(schema: &Schema, table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            columns: table.columns.iter().map(ColumnDef::from_column).collect(),
            primary_key: table
                .primary_key
                .as_ref()
                .map(|key| KeyDef::primary_key(table, key)),
            unique_constraints: table
                .unique_constraints
                .iter()
                .map(|key| KeyDef::unique_constraint(table, key))
                .collect(),
            foreign_keys: table
                .foreign_keys
                .iter()
                .map(|fk| ForeignKeyDef::new(schema, table, fk))
                .collect(),
            check_constraints: table.check_constraints.clone(),
            comment: table.comment.clone(),
            annotations: table.annotations.clone(),
        }
    }
}

impl Operation {
    pub fn create_table(schema: &Schema, table: &Table) -> Self {
        CreateTable::new(schema, table).into()
    }

    pub fn drop_table(table: &Table) -> Self {
        DropTable {
            name: table.name.clone(),
        }
        .into()
    }

    pub fn rename_table(from: &Table, to: &Table) -> Self {
        RenameTable {
            name: from.name.clone(),
            new_name: to.name.clone(),
        }
        .into()
    }

    pub fn alter_table(from: &Table, to: &Table) -> Self {
        AlterTable {
            name: to.name.clone(),
            comment: to.comment.clone(),
            old_comment: from.comment.clone(),
            annotations: to.annotations.clone(),
            old_annotations: from.annotations.clone(),
        }
        .into()
    }
}

impl From<CreateTable> for Operation {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}

impl From<DropTable> for Operation {
    fn from(value: DropTable) -> Self {
        Self::DropTable(value)
    }
}

impl From<RenameTable> for Operation {
    fn from(value: RenameTable) -> Self {
        Self::RenameTable(value)
    }
}

impl From<AlterTable> for Operation {
    fn from(value: AlterTable) -> Self {
        Self::AlterTable(value)
    }
}
