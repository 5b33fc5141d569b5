use super::diff::Matching;
use super::{DiffContext, RenameReason, Type};
use crate::schema::app::SequenceCache;
use crate::schema::{Annotations, ObjectName};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sequence {
    pub id: SequenceId,

    pub name: ObjectName,

    pub ty: Type,

    pub start: i64,

    pub increment: i64,

    pub min: Option<i64>,

    pub max: Option<i64>,

    pub cyclic: bool,

    pub cache: SequenceCache,

    pub annotations: Annotations,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceId(pub usize);

impl Sequence {
    /// Changes `ALTER SEQUENCE` can apply in place.
    fn same_options(&self, other: &Sequence) -> bool {
        self.increment == other.increment
            && self.min == other.min
            && self.max == other.max
            && self.cyclic == other.cyclic
            && self.cache == other.cache
            && self.annotations == other.annotations
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "SequenceId({})", self.0)
    }
}

pub struct SequencesDiff<'a> {
    items: Vec<SequencesDiffItem<'a>>,
}

impl<'a> SequencesDiff<'a> {
    pub fn from(cx: &DiffContext<'a>, from: &'a [Sequence], to: &'a [Sequence]) -> Self {
        let hints = cx.rename_hints();
        let mut matching = Matching::new(from.len(), to.len());

        matching.pass(Some(RenameReason::Hint), |i, j| {
            hints.get_sequence(&from[i].name) == Some(&to[j].name)
        });
        matching.pass(None, |i, j| from[i].name == to[j].name);
        matching.pass(Some(RenameReason::SchemaMoved), |i, j| {
            from[i].name.name == to[j].name.name
        });

        let mut items = vec![];
        for (i, from) in from.iter().enumerate() {
            let Some((j, reason)) = matching.get(i) else {
                items.push(SequencesDiffItem::DropSequence(from));
                continue;
            };
            let to = &to[j];

            // The value type cannot be altered in place.
            if from.ty != to.ty {
                items.push(SequencesDiffItem::DropSequence(from));
                items.push(SequencesDiffItem::CreateSequence(to));
                continue;
            }

            if from.name != to.name {
                let reason = reason.unwrap_or(RenameReason::Hint);
                items.push(SequencesDiffItem::RenameSequence { from, to, reason });
            }
            if !from.same_options(to) {
                items.push(SequencesDiffItem::AlterSequence { from, to });
            }
            if from.start != to.start {
                items.push(SequencesDiffItem::RestartSequence { from, to });
            }
        }

        for j in matching.untaken() {
            items.push(SequencesDiffItem::CreateSequence(&to[j]));
        }

        Self { items }
    }

    pub fn items(&self) -> &[SequencesDiffItem<'a>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
pub enum SequencesDiffItem<'a> {
    CreateSequence(&'a Sequence),
    DropSequence(&'a Sequence),
    RenameSequence {
        from: &'a Sequence,
        to: &'a Sequence,
        reason: RenameReason,
    },
    AlterSequence {
        from: &'a Sequence,
        to: &'a Sequence,
    },
    RestartSequence {
        from: &'a Sequence,
        to: &'a Sequence,
    },
}
