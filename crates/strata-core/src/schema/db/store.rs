use super::{FunctionId, ProcedureId, TableId, ViewId};

use std::fmt;

/// Identifies a store object holding columns.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreObjectId {
    Table(TableId),
    View(ViewId),
    Function(FunctionId),
    StoredProcedure(ProcedureId),
}

impl StoreObjectId {
    pub fn as_table(self) -> Option<TableId> {
        match self {
            StoreObjectId::Table(id) => Some(id),
            _ => None,
        }
    }
}

impl From<TableId> for StoreObjectId {
    fn from(value: TableId) -> Self {
        StoreObjectId::Table(value)
    }
}

impl From<ViewId> for StoreObjectId {
    fn from(value: ViewId) -> Self {
        StoreObjectId::View(value)
    }
}

impl From<FunctionId> for StoreObjectId {
    fn from(value: FunctionId) -> Self {
        StoreObjectId::Function(value)
    }
}

impl From<ProcedureId> for StoreObjectId {
    fn from(value: ProcedureId) -> Self {
        StoreObjectId::StoredProcedure(value)
    }
}

impl fmt::Debug for StoreObjectId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreObjectId::Table(id) => write!(fmt, "Table({})", id.0),
            StoreObjectId::View(id) => write!(fmt, "View({})", id.0),
            StoreObjectId::Function(id) => write!(fmt, "Function({})", id.0),
            StoreObjectId::StoredProcedure(id) => write!(fmt, "StoredProcedure({})", id.0),
        }
    }
}
