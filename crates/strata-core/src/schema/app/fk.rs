use super::{EntityTypeId, PropertyId};
use crate::schema::Annotations;

/// A relationship, declared on its dependent entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// The principal entity type
    pub principal: EntityTypeId,

    /// Foreign key properties on the dependent
    pub properties: Vec<PropertyId>,

    /// The principal's key the foreign key references
    pub principal_key: Vec<PropertyId>,

    /// Navigation on the dependent pointing to the principal
    pub navigation: Option<String>,

    /// Navigation on the principal pointing back to the dependent
    pub inverse: Option<String>,

    /// One-to-one when `true`
    pub unique: bool,

    pub required: bool,

    pub on_delete: ReferentialAction,

    /// Constraint name; derived when `None`
    pub name: Option<String>,

    /// The relationship binding an owned type to its owner
    pub is_ownership: bool,

    pub annotations: Annotations,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub const ALL: [ReferentialAction; 5] = [
        ReferentialAction::NoAction,
        ReferentialAction::Restrict,
        ReferentialAction::Cascade,
        ReferentialAction::SetNull,
        ReferentialAction::SetDefault,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NoAction",
            ReferentialAction::Restrict => "Restrict",
            ReferentialAction::Cascade => "Cascade",
            ReferentialAction::SetNull => "SetNull",
            ReferentialAction::SetDefault => "SetDefault",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}
