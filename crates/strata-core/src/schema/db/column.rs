use super::diff::Matching;
use super::{DiffContext, RenameReason, StoreObjectId, TableId, Type};
use crate::schema::app::ValueGenerated;
use crate::schema::{Annotations, ComputedColumn, DefaultValue, ObjectName};

use std::fmt;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    /// Uniquely identifies the column in the schema.
    pub id: ColumnId,

    /// The name of the column in the database.
    pub name: String,

    /// The database storage type of the column.
    pub ty: Type,

    /// Nullable when any property mapped to the column is.
    pub nullable: bool,

    pub default: Option<DefaultValue>,

    pub computed: Option<ComputedColumn>,

    pub value_generated: ValueGenerated,

    pub concurrency_token: bool,

    pub comment: Option<String>,

    pub collation: Option<String>,

    pub annotations: Annotations,

    /// Properties stored in this column
    pub mappings: Vec<ColumnMapping>,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnId {
    pub store: StoreObjectId,
    pub index: usize,
}

/// A property contributing to a column, by name so it can be compared
/// across models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnMapping {
    /// Entity type name
    pub entity: String,

    /// Property path within the entity type: `Street` or `Address.Street`
    /// for members of complex properties
    pub property: String,
}

impl Column {
    pub(crate) fn new(id: ColumnId, name: impl Into<String>, ty: Type) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            computed: None,
            value_generated: ValueGenerated::Never,
            concurrency_token: false,
            comment: None,
            collation: None,
            annotations: Annotations::new(),
            mappings: vec![],
        }
    }

    /// Compares everything a migration can change, ignoring the name and the
    /// mapped properties.
    pub fn same_definition(&self, other: &Column) -> bool {
        self.ty == other.ty
            && self.nullable == other.nullable
            && self.default == other.default
            && self.computed == other.computed
            && self.value_generated == other.value_generated
            && self.comment == other.comment
            && self.collation == other.collation
            && self.annotations == other.annotations
    }

    fn shares_mapping(&self, other: &Column) -> bool {
        self.mappings.iter().any(|m| other.mappings.contains(m))
    }
}

impl ColumnId {
    pub(crate) fn placeholder() -> Self {
        Self {
            store: StoreObjectId::Table(TableId::placeholder()),
            index: usize::MAX,
        }
    }

    pub fn table(&self) -> Option<TableId> {
        self.store.as_table()
    }
}

impl From<&Column> for ColumnId {
    fn from(value: &Column) -> Self {
        value.id
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ColumnId({:?}/{})", self.store, self.index)
    }
}

/// Column changes of one matched table.
pub struct ColumnsDiff<'a> {
    items: Vec<ColumnsDiffItem<'a>>,

    /// For each previous column, the index of the next column it became
    matches: Vec<Option<usize>>,
}

impl<'a> ColumnsDiff<'a> {
    /// `table` is the previous table name, used to look up hints.
    pub fn from(
        cx: &DiffContext<'a>,
        table: &ObjectName,
        from: &'a [Column],
        to: &'a [Column],
    ) -> Self {
        let hints = cx.rename_hints();
        let mut matching = Matching::new(from.len(), to.len());

        matching.pass(Some(RenameReason::Hint), |i, j| {
            hints.get_column(table, &from[i].name) == Some(to[j].name.as_str())
        });
        matching.pass(None, |i, j| from[i].name == to[j].name);
        matching.pass(Some(RenameReason::SharedProperty), |i, j| {
            from[i].shares_mapping(&to[j])
        });

        // Identical definition, only when the pairing is unambiguous
        for i in 0..from.len() {
            if matching.is_matched(i) {
                continue;
            }
            let candidates: Vec<usize> = matching
                .untaken()
                .filter(|j| from[i].same_definition(&to[*j]))
                .collect();
            let [j] = candidates[..] else { continue };
            let rivals = matching
                .unmatched_from()
                .filter(|k| from[*k].same_definition(&to[j]))
                .count();
            if rivals == 1 {
                matching.pair(i, j, Some(RenameReason::SameDefinition));
            }
        }

        let mut items = vec![];
        for (i, from) in from.iter().enumerate() {
            let Some((j, reason)) = matching.get(i) else {
                items.push(ColumnsDiffItem::DropColumn(from));
                continue;
            };
            let to = &to[j];
            if from.name != to.name {
                let reason = reason.unwrap_or(RenameReason::Hint);
                if reason.is_heuristic() {
                    info!(
                        table = %table,
                        from = %from.name,
                        to = %to.name,
                        reason = reason.describe(),
                        "column rename detected"
                    );
                }
                items.push(ColumnsDiffItem::RenameColumn { from, to, reason });
            }
            if !from.same_definition(to) {
                items.push(ColumnsDiffItem::AlterColumn { from, to });
            }
        }

        for j in matching.untaken() {
            items.push(ColumnsDiffItem::AddColumn(&to[j]));
        }

        Self {
            items,
            matches: matching.into_matches(),
        }
    }

    pub fn items(&self) -> &[ColumnsDiffItem<'a>] {
        &self.items
    }

    /// Index of the next column the previous column at `index` became.
    pub fn matched(&self, index: usize) -> Option<usize> {
        self.matches.get(index).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
pub enum ColumnsDiffItem<'a> {
    AddColumn(&'a Column),
    DropColumn(&'a Column),
    AlterColumn {
        from: &'a Column,
        to: &'a Column,
    },
    RenameColumn {
        from: &'a Column,
        to: &'a Column,
        reason: RenameReason,
    },
}
