use super::{ColumnId, TableId};
use crate::schema::app::ReferentialAction;
use crate::schema::Annotations;

/// A foreign key constraint, stored on the dependent table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForeignKey {
    pub name: String,

    /// Columns of the dependent table
    pub columns: Vec<ColumnId>,

    /// Referenced table
    pub principal: TableId,

    /// Referenced columns, one per entry of `columns`
    pub principal_columns: Vec<ColumnId>,

    pub on_delete: ReferentialAction,

    pub annotations: Annotations,
}
