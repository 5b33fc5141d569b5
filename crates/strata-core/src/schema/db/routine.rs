use super::{Column, ColumnMapping, Type};
use crate::schema::app::{ParameterDirection, ProcedureKind};
use crate::schema::ObjectName;

use std::fmt;

/// A view mapped by one or more entity types.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct View {
    pub id: ViewId,

    pub name: ObjectName,

    pub columns: Vec<Column>,

    /// `SELECT` body. Views without one are not managed by migrations.
    pub definition: Option<String>,

    /// Names of the entity types mapped to the view
    pub entity_types: Vec<String>,
}

/// A table-valued function mapped by one or more entity types.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub id: FunctionId,

    pub name: ObjectName,

    pub columns: Vec<Column>,

    pub definition: Option<String>,

    pub entity_types: Vec<String>,
}

/// An insert, update or delete stored procedure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredProcedure {
    pub id: ProcedureId,

    pub name: ObjectName,

    pub kind: ProcedureKind,

    pub parameters: Vec<Parameter>,

    /// Columns of the result set read back after the call
    pub result_columns: Vec<Column>,

    pub definition: Option<String>,

    pub entity_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub name: String,

    pub ty: Type,

    pub direction: ParameterDirection,

    /// Bound to the value loaded from the store rather than the current one
    pub original_value: bool,

    pub mapping: ColumnMapping,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewId(pub usize);

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionId(pub usize);

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcedureId(pub usize);

/// A store object defined by SQL text: views, functions and procedures.
///
/// Migrations create and drop routines that carry a definition; the others
/// are assumed to exist.
pub trait Routine {
    fn name(&self) -> &ObjectName;

    fn definition(&self) -> Option<&str>;

    fn is_managed(&self) -> bool {
        self.definition().is_some()
    }
}

impl Routine for View {
    fn name(&self) -> &ObjectName {
        &self.name
    }

    fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }
}

impl Routine for Function {
    fn name(&self) -> &ObjectName {
        &self.name
    }

    fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }
}

impl Routine for StoredProcedure {
    fn name(&self) -> &ObjectName {
        &self.name
    }

    fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }
}

/// Managed routines to create and drop. A routine whose definition changed
/// is dropped and created again.
pub struct RoutinesDiff<'a, T> {
    items: Vec<RoutinesDiffItem<'a, T>>,
}

impl<'a, T: Routine> RoutinesDiff<'a, T> {
    pub fn from(from: &'a [T], to: &'a [T]) -> Self {
        let mut items = vec![];

        for from in from.iter().filter(|r| r.is_managed()) {
            let kept = to.iter().any(|to| same_routine(from, to));
            if !kept {
                items.push(RoutinesDiffItem::Drop(from));
            }
        }

        for to in to.iter().filter(|r| r.is_managed()) {
            let existing = from.iter().any(|from| same_routine(from, to));
            if !existing {
                items.push(RoutinesDiffItem::Create(to));
            }
        }

        Self { items }
    }

    pub fn items(&self) -> &[RoutinesDiffItem<'a, T>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn same_routine<T: Routine>(from: &T, to: &T) -> bool {
    from.is_managed()
        && to.is_managed()
        && from.name() == to.name()
        && from.definition() == to.definition()
}

#[derive(Debug)]
pub enum RoutinesDiffItem<'a, T> {
    Create(&'a T),
    Drop(&'a T),
}

impl fmt::Debug for ViewId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ViewId({})", self.0)
    }
}

impl fmt::Debug for FunctionId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FunctionId({})", self.0)
    }
}

impl fmt::Debug for ProcedureId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ProcedureId({})", self.0)
    }
}
