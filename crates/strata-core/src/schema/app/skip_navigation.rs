use super::EntityTypeId;

/// One side of a many-to-many relationship, reaching the target through a
/// join entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipNavigation {
    pub name: String,

    pub target: EntityTypeId,

    /// Navigation on the target pointing back
    pub inverse: Option<String>,

    pub join_entity: EntityTypeId,
}
