use super::Operation;

use strata_core::schema::app::ReferentialAction;
use strata_core::schema::db::{
    CheckConstraint, ColumnId, ForeignKey, PrimaryKey, Schema, Table, Trigger, UniqueConstraint,
};
use strata_core::schema::{Annotations, ObjectName};

/// A primary key or unique constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDef {
    pub table: ObjectName,
    pub name: String,
    pub columns: Vec<String>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    /// Dependent table
    pub table: ObjectName,
    pub name: String,
    pub columns: Vec<String>,
    pub principal_table: ObjectName,
    pub principal_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddPrimaryKey {
    pub key: KeyDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropPrimaryKey {
    pub table: ObjectName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddUniqueConstraint {
    pub key: KeyDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropUniqueConstraint {
    pub table: ObjectName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddForeignKey {
    pub foreign_key: ForeignKeyDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropForeignKey {
    pub table: ObjectName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddCheckConstraint {
    pub table: ObjectName,
    pub name: String,
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropCheckConstraint {
    pub table: ObjectName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddTrigger {
    pub table: ObjectName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTrigger {
    pub table: ObjectName,
    pub name: String,
}

impl KeyDef {
    pub fn primary_key(table: &Table, key: &PrimaryKey) -> Self {
        Self {
            table: table.name.clone(),
            name: key.name.clone(),
            columns: column_names(table, &key.columns),
            annotations: key.annotations.clone(),
        }
    }

    pub fn unique_constraint(table: &Table, key: &UniqueConstraint) -> Self {
        Self {
            table: table.name.clone(),
            name: key.name.clone(),
            columns: column_names(table, &key.columns),
            annotations: key.annotations.clone(),
        }
    }
}

impl ForeignKeyDef {
    /// `schema` is the model `table` belongs to; it resolves the principal.
    pub fn new(schema: &Schema, table: &Table, fk: &ForeignKey) -> Self {
        let principal = schema.table(fk.principal);
        Self {
            table: table.name.clone(),
            name: fk.name.clone(),
            columns: column_names(table, &fk.columns),
            principal_table: principal.name.clone(),
            principal_columns: column_names(principal, &fk.principal_columns),
            on_delete: fk.on_delete,
            annotations: fk.annotations.clone(),
        }
    }
}

fn column_names(table: &Table, columns: &[ColumnId]) -> Vec<String> {
    table
        .column_names(columns)
        .into_iter()
        .map(String::from)
        .collect()
}

impl Operation {
    pub fn add_primary_key(table: &Table, key: &PrimaryKey) -> Self {
        AddPrimaryKey {
            key: KeyDef::primary_key(table, key),
        }
        .into()
    }

    pub fn drop_primary_key(table: &Table, key: &PrimaryKey) -> Self {
        DropPrimaryKey {
            table: table.name.clone(),
            name: key.name.clone(),
        }
        .into()
    }

    pub fn add_unique_constraint(table: &Table, key: &UniqueConstraint) -> Self {
        AddUniqueConstraint {
            key: KeyDef::unique_constraint(table, key),
        }
        .into()
    }

    pub fn drop_unique_constraint(table: &Table, key: &UniqueConstraint) -> Self {
        DropUniqueConstraint {
            table: table.name.clone(),
            name: key.name.clone(),
        }
        .into()
    }

    pub fn add_foreign_key(schema: &Schema, table: &Table, fk: &ForeignKey) -> Self {
        AddForeignKey {
            foreign_key: ForeignKeyDef::new(schema, table, fk),
        }
        .into()
    }

    pub fn drop_foreign_key(table: &Table, fk: &ForeignKey) -> Self {
        DropForeignKey {
            table: table.name.clone(),
            name: fk.name.clone(),
        }
        .into()
    }

    pub fn add_check_constraint(table: &Table, check: &CheckConstraint) -> Self {
        AddCheckConstraint {
            table: table.name.clone(),
            name: check.name.clone(),
            sql: check.sql.clone(),
        }
        .into()
    }

    pub fn drop_check_constraint(table: &Table, check: &CheckConstraint) -> Self {
        DropCheckConstraint {
            table: table.name.clone(),
            name: check.name.clone(),
        }
        .into()
    }

    pub fn add_trigger(table: &Table, trigger: &Trigger) -> Self {
        AddTrigger {
            table: table.name.clone(),
            name: trigger.name.clone(),
        }
        .into()
    }

    pub fn drop_trigger(table: &Table, trigger: &Trigger) -> Self {
        DropTrigger {
            table: table.name.clone(),
            name: trigger.name.clone(),
        }
        .into()
    }
}

impl From<AddPrimaryKey> for Operation {
    fn from(value: AddPrimaryKey) -> Self {
        Self::AddPrimaryKey(value)
    }
}

impl From<DropPrimaryKey> for Operation {
    fn from(value: DropPrimaryKey) -> Self {
        Self::DropPrimaryKey(value)
    }
}

impl From<AddUniqueConstraint> for Operation {
    fn from(value: AddUniqueConstraint) -> Self {
        Self::AddUniqueConstraint(value)
    }
}

impl From<DropUniqueConstraint> for Operation {
    fn from(value: DropUniqueConstraint) -> Self {
        Self::DropUniqueConstraint(value)
    }
}

impl From<AddForeignKey> for Operation {
    fn from(value: AddForeignKey) -> Self {
        Self::AddForeignKey(value)
    }
}

impl From<DropForeignKey> for Operation {
    fn from(value: DropForeignKey) -> Self {
        Self::DropForeignKey(value)
    }
}

impl From<AddCheckConstraint> for Operation {
    fn from(value: AddCheckConstraint) -> Self {
        Self::AddCheckConstraint(value)
    }
}

impl From<DropCheckConstraint> for Operation {
    fn from(value: DropCheckConstraint) -> Self {
        Self::DropCheckConstraint(value)
    }
}

impl From<AddTrigger> for Operation {
    fn from(value: AddTrigger) -> Self {
        Self::AddTrigger(value)
    }
}

impl From<DropTrigger> for Operation {
    fn from(value: DropTrigger) -> Self {
        Self::DropTrigger(value)
    }
}
