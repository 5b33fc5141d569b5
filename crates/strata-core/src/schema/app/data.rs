use super::PropertyId;
use crate::schema::Value;

/// A row an entity type is seeded with. Properties left out take their
/// store default.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRow {
    /// Values in declaration order
    pub values: Vec<(PropertyId, Value)>,
}

impl SeedRow {
    pub fn get(&self, property: PropertyId) -> Option<&Value> {
        self.values
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, value)| value)
    }
}
