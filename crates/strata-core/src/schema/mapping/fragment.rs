use crate::schema::app::PropertyId;
use crate::schema::db::{ColumnId, StoreObjectId};

/// The part of an entity type stored in one store object.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub store: StoreObjectId,

    /// Properties stored in the object, in column order of first
    /// appearance.
    pub properties: Vec<PropertyMapping>,
}

/// A property and the column holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMapping {
    /// `Street`, or `Address.Street` for members of complex properties
    pub path: String,

    /// `None` for members of complex properties and JSON containers, which
    /// have no property ID of their own
    pub property: Option<PropertyId>,

    pub column: ColumnId,
}

impl Fragment {
    pub(crate) fn new(store: StoreObjectId) -> Self {
        Self {
            store,
            properties: vec![],
        }
    }

    pub fn column(&self, property: PropertyId) -> Option<ColumnId> {
        self.properties
            .iter()
            .find(|p| p.property == Some(property))
            .map(|p| p.column)
    }

    pub fn find_column(&self, path: &str) -> Option<ColumnId> {
        self.properties
            .iter()
            .find(|p| p.path == path)
            .map(|p| p.column)
    }
}
