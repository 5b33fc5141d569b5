use super::{CheckConstraint, PropertyId, Trigger};
use crate::schema::ObjectName;

/// Kind of store object a fragment maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreObjectKind {
    Table,
    View,
    Function,
    StoredProcedure,
}

/// Part of an entity type's properties mapped to an additional table or
/// view (entity splitting). The fragment shares the entity's primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitFragment {
    pub kind: StoreObjectKind,

    pub name: ObjectName,

    pub properties: Vec<PropertyId>,

    pub excluded_from_migrations: bool,

    pub check_constraints: Vec<CheckConstraint>,

    pub triggers: Vec<Trigger>,

    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMapping {
    pub name: ObjectName,

    /// `SELECT` body. Views without one are mapped but not managed by
    /// migrations.
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMapping {
    pub name: ObjectName,

    /// Function body. Functions without one are mapped but not managed.
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcedureKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProcedureMapping {
    pub kind: ProcedureKind,

    pub name: ObjectName,

    pub parameters: Vec<ProcedureParameter>,

    /// Properties read back from the procedure's result set
    pub result_columns: Vec<PropertyId>,

    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParameter {
    pub property: PropertyId,

    /// Parameter name; the property's column name when `None`
    pub name: Option<String>,

    pub direction: ParameterDirection,

    /// Binds the value the property had when it was loaded (concurrency
    /// checks in update and delete procedures)
    pub original_value: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
}

impl ProcedureKind {
    pub const ALL: [ProcedureKind; 3] = [
        ProcedureKind::Insert,
        ProcedureKind::Update,
        ProcedureKind::Delete,
    ];
}
