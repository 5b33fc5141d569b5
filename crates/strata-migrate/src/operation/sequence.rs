use super::Operation;

use strata_core::schema::app::SequenceCache;
use strata_core::schema::db::{self, Sequence};
use strata_core::schema::{Annotations, ObjectName};

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDef {
    pub name: ObjectName,
    pub ty: db::Type,
    pub start: i64,
    pub increment: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub cyclic: bool,
    pub cache: SequenceCache,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSequence {
    pub sequence: SequenceDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropSequence {
    pub name: ObjectName,
}

/// Changes increment, bounds, cycling, caching or annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterSequence {
    pub sequence: SequenceDef,
    pub old_sequence: SequenceDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameSequence {
    pub name: ObjectName,
    pub new_name: ObjectName,
}

/// Resets the next value a sequence hands out.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartSequence {
    pub name: ObjectName,
    pub start: i64,
}

impl SequenceDef {
    pub fn from_sequence(sequence: &Sequence) -> Self {
        Self {
            name: sequence.name.clone(),
            ty: sequence.ty.clone(),
            start: sequence.start,
            increment: sequence.increment,
            min: sequence.min,
            max: sequence.max,
            cyclic: sequence.cyclic,
            cache: sequence.cache,
            annotations: sequence.annotations.clone(),
        }
    }
}

impl Operation {
    pub fn create_sequence(sequence: &Sequence) -> Self {
        CreateSequence {
            sequence: SequenceDef::from_sequence(sequence),
        }
        .into()
    }

    pub fn drop_sequence(sequence: &Sequence) -> Self {
        DropSequence {
            name: sequence.name.clone(),
        }
        .into()
    }

    pub fn alter_sequence(from: &Sequence, to: &Sequence) -> Self {
        AlterSequence {
            sequence: SequenceDef::from_sequence(to),
            old_sequence: SequenceDef::from_sequence(from),
        }
        .into()
    }

    pub fn rename_sequence(from: &Sequence, to: &Sequence) -> Self {
        RenameSequence {
            name: from.name.clone(),
            new_name: to.name.clone(),
        }
        .into()
    }

    pub fn restart_sequence(sequence: &Sequence) -> Self {
        RestartSequence {
            name: sequence.name.clone(),
            start: sequence.start,
        }
        .into()
    }
}

impl From<CreateSequence> for Operation {
    fn from(value: CreateSequence) -> Self {
        Self::CreateSequence(value)
    }
}

impl From<DropSequence> for Operation {
    fn from(value: DropSequence) -> Self {
        Self::DropSequence(value)
    }
}

impl From<AlterSequence> for Operation {
    fn from(value: AlterSequence) -> Self {
        Self::AlterSequence(value)
    }
}

impl From<RenameSequence> for Operation {
    fn from(value: RenameSequence) -> Self {
        Self::RenameSequence(value)
    }
}

impl From<RestartSequence> for Operation {
    fn from(value: RestartSequence) -> Self {
        Self::RestartSequence(value)
    }
}
