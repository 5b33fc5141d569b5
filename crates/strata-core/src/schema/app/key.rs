use super::PropertyId;
use crate::schema::Annotations;

#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    /// Properties composing the key, in key order
    pub properties: Vec<PropertyId>,

    /// Constraint name; derived from the table name when `None`
    pub name: Option<String>,

    pub annotations: Annotations,
}
