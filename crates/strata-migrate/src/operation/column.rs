use super::Operation;

use strata_core::schema::app::ValueGenerated;
use strata_core::schema::db::{self, Column, Table};
use strata_core::schema::{Annotations, ComputedColumn, DefaultValue, ObjectName};

/// Everything needed to create a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: db::Type,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub computed: Option<ComputedColumn>,
    pub value_generated: ValueGenerated,
    pub comment: Option<String>,
    pub collation: Option<String>,
    pub annotations: Annotations,
}

/// Adds a column to an existing table.
#[derive(Debug, Clone, PartialEq)]
pub struct AddColumn {
    pub table: ObjectName,
    pub column: ColumnDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropColumn {
    pub table: ObjectName,
    pub name: String,
}

/// Changes a column's definition in place. The column keeps its name;
/// renames are separate operations.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterColumn {
    pub table: ObjectName,

    /// New definition
    pub column: ColumnDef,

    /// Definition before the change
    pub old_column: ColumnDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameColumn {
    pub table: ObjectName,
    pub name: String,
    pub new_name: String,
}

impl ColumnDef {
    pub fn from_column(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            ty: column.ty.clone(),
            nullable: column.nullable,
            default: column.default.clone(),
            computed: column.computed.clone(),
            value_generated: column.value_generated,
            comment: column.comment.clone(),
            collation: column.collation.clone(),
            annotations: column.annotations.clone(),
        }
    }
}

impl AlterColumn {
    /// Making a column required or changing its type can fail on, or
    /// truncate, existing rows.
    pub fn is_destructive(&self) -> bool {
        (self.old_column.nullable && !self.column.nullable) || self.old_column.ty != self.column.ty
    }
}

impl Operation {
    pub fn add_column(table: &Table, column: &Column) -> Self {
        AddColumn {
            table: table.name.clone(),
            column: ColumnDef::from_column(column),
        }
        .into()
    }

    pub fn drop_column(table: &Table, column: &Column) -> Self {
        DropColumn {
            table: table.name.clone(),
            name: column.name.clone(),
        }
        .into()
    }

    /// `table` is the table after the change; `from` and `to` are the
    /// column before and after it.
    pub fn alter_column(table: &Table, from: &Column, to: &Column) -> Self {
        AlterColumn {
            table: table.name.clone(),
            column: ColumnDef::from_column(to),
            old_column: ColumnDef::from_column(from),
        }
        .into()
    }

    pub fn rename_column(table: &Table, from: &Column, to: &Column) -> Self {
        RenameColumn {
            table: table.name.clone(),
            name: from.name.clone(),
            new_name: to.name.clone(),
        }
        .into()
    }
}

impl From<AddColumn> for Operation {
    fn from(value: AddColumn) -> Self {
        Self::AddColumn(value)
    }
}

impl From<DropColumn> for Operation {
    fn from(value: DropColumn) -> Self {
        Self::DropColumn(value)
    }
}

impl From<AlterColumn> for Operation {
    fn from(value: AlterColumn) -> Self {
        Self::AlterColumn(value)
    }
}

impl From<RenameColumn> for Operation {
    fn from(value: RenameColumn) -> Self {
        Self::RenameColumn(value)
    }
}
