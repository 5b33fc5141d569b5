/// A check constraint on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckConstraint {
    pub name: String,

    /// Boolean SQL expression every row must satisfy
    pub sql: String,
}

/// A trigger on a table. Only the name is modeled; the body lives outside
/// the model.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trigger {
    pub name: String,
}
