use super::Type;
use crate::schema::{Annotations, ObjectName};

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub name: ObjectName,

    /// One of the integer types
    pub ty: Type,

    pub start: i64,

    pub increment: i64,

    pub min: Option<i64>,

    pub max: Option<i64>,

    pub cyclic: bool,

    pub cache: SequenceCache,

    pub annotations: Annotations,
}

/// Number of values a store pre-allocates for a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceCache {
    /// Store default
    #[default]
    Default,
    NoCache,
    Size(u32),
}

impl Sequence {
    pub fn new(name: ObjectName) -> Self {
        Self {
            name,
            ty: Type::I64,
            start: 1,
            increment: 1,
            min: None,
            max: None,
            cyclic: false,
            cache: SequenceCache::Default,
            annotations: Annotations::new(),
        }
    }
}
