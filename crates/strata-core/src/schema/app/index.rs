use super::PropertyId;
use crate::schema::Annotations;

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Properties included in the index
    pub properties: Vec<PropertyId>,

    /// Index name; derived from the table and column names when `None`
    pub name: Option<String>,

    /// When `true`, indexed entries are unique
    pub unique: bool,

    /// Per-property sort direction. Empty means all ascending.
    pub descending: Vec<bool>,

    /// Partial index predicate
    pub filter: Option<String>,

    pub annotations: Annotations,
}
