use super::ColumnId;
use crate::schema::Annotations;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryKey {
    /// Constraint name
    pub name: String,

    /// Columns composing the primary key, in key order
    pub columns: Vec<ColumnId>,

    pub annotations: Annotations,
}

/// Unique constraint backing an alternate key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniqueConstraint {
    pub name: String,

    pub columns: Vec<ColumnId>,

    pub annotations: Annotations,
}
