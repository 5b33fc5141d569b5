mod column;
pub use column::{AddColumn, AlterColumn, ColumnDef, DropColumn, RenameColumn};

mod constraint;
pub use constraint::{
    AddCheckConstraint, AddForeignKey, AddPrimaryKey, AddTrigger, AddUniqueConstraint,
    DropCheckConstraint, DropForeignKey, DropPrimaryKey, DropTrigger, DropUniqueConstraint,
    ForeignKeyDef, KeyDef,
};

mod data;
pub use data::{DeleteData, InsertData, UpdateData};

mod database;
pub use database::{AlterDatabase, EnsureSchema};

mod index;
pub use index::{AddIndex, DropIndex, IndexColumnDef, RenameIndex};

mod routine;
pub use routine::{
    CreateFunction, CreateStoredProcedure, CreateView, DropFunction, DropStoredProcedure,
    DropView,
};

mod sequence;
pub use sequence::{
    AlterSequence, CreateSequence, DropSequence, RenameSequence, RestartSequence, SequenceDef,
};

mod table;
pub use table::{AlterTable, CreateTable, DropTable, RenameTable};

use std::fmt;

/// One self-contained step of a migration.
///
/// Every operation owns the full definition of what it creates or changes,
/// so an executor can run it without the models it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    EnsureSchema(EnsureSchema),
    CreateTable(CreateTable),
    DropTable(DropTable),
    RenameTable(RenameTable),
    AlterTable(AlterTable),
    AddColumn(AddColumn),
    DropColumn(DropColumn),
    AlterColumn(AlterColumn),
    RenameColumn(RenameColumn),
    AddPrimaryKey(AddPrimaryKey),
    DropPrimaryKey(DropPrimaryKey),
    AddUniqueConstraint(AddUniqueConstraint),
    DropUniqueConstraint(DropUniqueConstraint),
    AddForeignKey(AddForeignKey),
    DropForeignKey(DropForeignKey),
    AddIndex(AddIndex),
    DropIndex(DropIndex),
    RenameIndex(RenameIndex),
    AddCheckConstraint(AddCheckConstraint),
    DropCheckConstraint(DropCheckConstraint),
    AddTrigger(AddTrigger),
    DropTrigger(DropTrigger),
    CreateSequence(CreateSequence),
    DropSequence(DropSequence),
    AlterSequence(AlterSequence),
    RenameSequence(RenameSequence),
    RestartSequence(RestartSequence),
    CreateView(CreateView),
    DropView(DropView),
    CreateFunction(CreateFunction),
    DropFunction(DropFunction),
    CreateStoredProcedure(CreateStoredProcedure),
    DropStoredProcedure(DropStoredProcedure),
    AlterDatabase(AlterDatabase),
    InsertData(InsertData),
    UpdateData(UpdateData),
    DeleteData(DeleteData),
}

impl Operation {
    /// `true` when running the operation may lose data.
    pub fn is_destructive(&self) -> bool {
        match self {
            Operation::DropTable(_) | Operation::DropColumn(_) | Operation::DeleteData(_) => true,
            Operation::AlterColumn(alter) => alter.is_destructive(),
            _ => false,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::EnsureSchema(op) => write!(f, "EnsureSchema({})", op.name),
            Operation::CreateTable(op) => write!(f, "CreateTable({})", op.name),
            Operation::DropTable(op) => write!(f, "DropTable({})", op.name),
            Operation::RenameTable(op) => write!(f, "RenameTable({} -> {})", op.name, op.new_name),
            Operation::AlterTable(op) => write!(f, "AlterTable({})", op.name),
            Operation::AddColumn(op) => write!(f, "AddColumn({}.{})", op.table, op.column.name),
            Operation::DropColumn(op) => write!(f, "DropColumn({}.{})", op.table, op.name),
            Operation::AlterColumn(op) => write!(f, "AlterColumn({}.{})", op.table, op.column.name),
            Operation::RenameColumn(op) => {
                write!(f, "RenameColumn({}.{} -> {})", op.table, op.name, op.new_name)
            }
            Operation::AddPrimaryKey(op) => write!(f, "AddPrimaryKey({}.{})", op.key.table, op.key.name),
            Operation::DropPrimaryKey(op) => write!(f, "DropPrimaryKey({}.{})", op.table, op.name),
            Operation::AddUniqueConstraint(op) => {
                write!(f, "AddUniqueConstraint({}.{})", op.key.table, op.key.name)
            }
            Operation::DropUniqueConstraint(op) => {
                write!(f, "DropUniqueConstraint({}.{})", op.table, op.name)
            }
            Operation::AddForeignKey(op) => {
                write!(f, "AddForeignKey({}.{})", op.foreign_key.table, op.foreign_key.name)
            }
            Operation::DropForeignKey(op) => write!(f, "DropForeignKey({}.{})", op.table, op.name),
            Operation::AddIndex(op) => write!(f, "AddIndex({}.{})", op.table, op.name),
            Operation::DropIndex(op) => write!(f, "DropIndex({}.{})", op.table, op.name),
            Operation::RenameIndex(op) => {
                write!(f, "RenameIndex({}.{} -> {})", op.table, op.name, op.new_name)
            }
            Operation::AddCheckConstraint(op) => {
                write!(f, "AddCheckConstraint({}.{})", op.table, op.name)
            }
            Operation::DropCheckConstraint(op) => {
                write!(f, "DropCheckConstraint({}.{})", op.table, op.name)
            }
            Operation::AddTrigger(op) => write!(f, "AddTrigger({}.{})", op.table, op.name),
            Operation::DropTrigger(op) => write!(f, "DropTrigger({}.{})", op.table, op.name),
            Operation::CreateSequence(op) => write!(f, "CreateSequence({})", op.sequence.name),
            Operation::DropSequence(op) => write!(f, "DropSequence({})", op.name),
            Operation::AlterSequence(op) => write!(f, "AlterSequence({})", op.sequence.name),
            Operation::RenameSequence(op) => {
                write!(f, "RenameSequence({} -> {})", op.name, op.new_name)
            }
            Operation::RestartSequence(op) => {
                write!(f, "RestartSequence({}, {})", op.name, op.start)
            }
            Operation::CreateView(op) => write!(f, "CreateView({})", op.name),
            Operation::DropView(op) => write!(f, "DropView({})", op.name),
            Operation::CreateFunction(op) => write!(f, "CreateFunction({})", op.name),
            Operation::DropFunction(op) => write!(f, "DropFunction({})", op.name),
            Operation::CreateStoredProcedure(op) => write!(f, "CreateStoredProcedure({})", op.name),
            Operation::DropStoredProcedure(op) => write!(f, "DropStoredProcedure({})", op.name),
            Operation::AlterDatabase(_) => f.write_str("AlterDatabase"),
            Operation::InsertData(op) => write!(f, "InsertData({})", op.table),
            Operation::UpdateData(op) => write!(f, "UpdateData({})", op.table),
            Operation::DeleteData(op) => write!(f, "DeleteData({})", op.table),
        }
    }
}
