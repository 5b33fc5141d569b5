use super::diff::Matching;
use super::{Column, ColumnId, ColumnsDiff, DiffContext, RenameReason, Schema, TableId};
use crate::schema::{Annotations, ObjectName};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Index {
    /// Uniquely identifies the index within the schema
    pub id: IndexId,

    /// Index name is unique within the table
    pub name: String,

    /// The table being indexed
    pub on: TableId,

    /// Columns included in the index.
    pub columns: Vec<IndexColumn>,

    /// When `true`, indexed entries are unique
    pub unique: bool,

    /// Partial index predicate
    pub filter: Option<String>,

    pub annotations: Annotations,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexId {
    pub table: TableId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexColumn {
    /// The column being indexed
    pub column: ColumnId,

    pub descending: bool,
}

impl Index {
    /// Same columns and sort order, with previous columns translated
    /// through `columns`.
    fn same_columns(&self, other: &Index, columns: &ColumnsDiff<'_>) -> bool {
        self.columns.len() == other.columns.len()
            && self.columns.iter().zip(&other.columns).all(|(s, o)| {
                columns.matched(s.column.index) == Some(o.column.index)
                    && s.descending == o.descending
            })
    }

    fn same_options(&self, other: &Index) -> bool {
        self.unique == other.unique
            && self.filter == other.filter
            && self.annotations == other.annotations
    }
}

impl IndexColumn {
    pub fn table_column<'a>(&self, schema: &'a Schema) -> &'a Column {
        schema.column(self.column)
    }
}

impl fmt::Debug for IndexId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "IndexId({}/{})", self.table.0, self.index)
    }
}

pub struct IndicesDiff<'a> {
    items: Vec<IndicesDiffItem<'a>>,
}

impl<'a> IndicesDiff<'a> {
    /// Indexes match by name and columns, then by name alone (rebuilt), then
    /// by columns alone (renamed).
    pub fn from(
        cx: &DiffContext<'a>,
        table: &ObjectName,
        columns: &ColumnsDiff<'a>,
        from: &'a [Index],
        to: &'a [Index],
    ) -> Self {
        let hints = cx.rename_hints();
        let mut matching = Matching::new(from.len(), to.len());

        matching.pass(Some(RenameReason::Hint), |i, j| {
            hints.get_index(table, &from[i].name) == Some(to[j].name.as_str())
        });
        matching.pass(None, |i, j| {
            from[i].name == to[j].name && from[i].same_columns(&to[j], columns)
        });
        matching.pass(None, |i, j| from[i].name == to[j].name);
        matching.pass(Some(RenameReason::SameColumns), |i, j| {
            from[i].same_columns(&to[j], columns) && from[i].same_options(&to[j])
        });

        let mut items = vec![];
        for (i, from) in from.iter().enumerate() {
            let Some((j, _)) = matching.get(i) else {
                items.push(IndicesDiffItem::DropIndex(from));
                continue;
            };
            let to = &to[j];
            let rebuild = !from.same_columns(to, columns) || !from.same_options(to);
            if rebuild {
                items.push(IndicesDiffItem::DropIndex(from));
                items.push(IndicesDiffItem::CreateIndex(to));
            } else if from.name != to.name {
                items.push(IndicesDiffItem::RenameIndex { from, to });
            }
        }

        for j in matching.untaken() {
            items.push(IndicesDiffItem::CreateIndex(&to[j]));
        }

        Self { items }
    }

    pub fn items(&self) -> &[IndicesDiffItem<'a>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
pub enum IndicesDiffItem<'a> {
    CreateIndex(&'a Index),
    DropIndex(&'a Index),
    RenameIndex { from: &'a Index, to: &'a Index },
}
