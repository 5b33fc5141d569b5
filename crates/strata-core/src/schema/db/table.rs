use super::diff::Matching;
use super::{
    CheckConstraint, Column, ColumnId, ColumnsDiff, DiffContext, ForeignKey, Index, IndicesDiff,
    PrimaryKey, RenameReason, Row, RowsDiff, Trigger, UniqueConstraint,
};
use crate::schema::{Annotations, ObjectName};

use std::fmt;
use tracing::{debug, info};

/// A database table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    /// Uniquely identifies a table
    pub id: TableId,

    /// Name of the table, schema-qualified when a schema applies
    pub name: ObjectName,

    /// The table's columns
    pub columns: Vec<Column>,

    /// `None` only for tables of keyless types
    pub primary_key: Option<PrimaryKey>,

    pub unique_constraints: Vec<UniqueConstraint>,

    pub indices: Vec<Index>,

    pub foreign_keys: Vec<ForeignKey>,

    pub check_constraints: Vec<CheckConstraint>,

    pub triggers: Vec<Trigger>,

    pub comment: Option<String>,

    /// Mapped, but never created, altered or dropped by migrations
    pub excluded_from_migrations: bool,

    /// Names of the entity types stored in the table
    pub entity_types: Vec<String>,

    pub annotations: Annotations,

    /// Seed rows, merged by primary key
    pub data: Vec<Row>,
}

/// Uniquely identifies a table
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableId(pub usize);

impl Table {
    pub(crate) fn new(id: TableId, name: ObjectName) -> Self {
        Self {
            id,
            name,
            columns: vec![],
            primary_key: None,
            unique_constraints: vec![],
            indices: vec![],
            foreign_keys: vec![],
            check_constraints: vec![],
            triggers: vec![],
            comment: None,
            excluded_from_migrations: false,
            entity_types: vec![],
            annotations: Annotations::new(),
            data: vec![],
        }
    }

    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        &self.columns[id.into().index]
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.primary_key
            .iter()
            .flat_map(|pk| pk.columns.iter())
            .map(|column_id| &self.columns[column_id.index])
    }

    /// Names of `columns`, in order.
    pub fn column_names(&self, columns: &[ColumnId]) -> Vec<&str> {
        columns
            .iter()
            .map(|id| self.columns[id.index].name.as_str())
            .collect()
    }

    /// `true` when the table stores `entity`, ignoring case.
    fn shares_entity_type(&self, other: &Table) -> bool {
        self.entity_types.iter().any(|a| {
            other
                .entity_types
                .iter()
                .any(|b| a.eq_ignore_ascii_case(b))
        })
    }

    /// Number of columns with a same-named, same-typed counterpart, or
    /// `None` when more than `tolerance` columns differ.
    fn fingerprint_score(&self, other: &Table, tolerance: usize) -> Option<usize> {
        if self.columns.len() != other.columns.len() || self.columns.is_empty() {
            return None;
        }

        let key = |table: &Table| -> Vec<String> {
            table.primary_key_columns().map(|c| c.name.clone()).collect()
        };
        if key(self) != key(other) {
            return None;
        }

        let score = self
            .columns
            .iter()
            .filter(|c| {
                other
                    .columns
                    .iter()
                    .any(|o| o.name == c.name && o.ty == c.ty)
            })
            .count();

        let required = self.columns.len().saturating_sub(tolerance).max(1);
        (score >= required).then_some(score)
    }
}

impl TableId {
    pub(crate) fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TableId({})", self.0)
    }
}

pub struct TablesDiff<'a> {
    items: Vec<TablesDiffItem<'a>>,
}

impl<'a> TablesDiff<'a> {
    pub fn from(cx: &DiffContext<'a>, from: &'a [Table], to: &'a [Table]) -> Self {
        let hints = cx.rename_hints();
        let mut matching = Matching::new(from.len(), to.len());

        matching.pass(Some(RenameReason::Hint), |i, j| {
            hints.get_table(&from[i].name) == Some(&to[j].name)
        });
        matching.pass(None, |i, j| from[i].name == to[j].name);
        matching.pass(Some(RenameReason::SharedEntityType), |i, j| {
            from[i].shares_entity_type(&to[j])
        });

        // Fingerprint: the best scoring candidate wins, the earliest one on
        // ties.
        for i in 0..from.len() {
            if matching.is_matched(i) {
                continue;
            }
            let mut best: Option<(usize, usize)> = None;
            for j in matching.untaken() {
                let Some(score) = from[i].fingerprint_score(&to[j], hints.fingerprint_tolerance()) else {
                    continue;
                };
                match best {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best = Some((j, score)),
                }
            }
            if let Some((j, _)) = best {
                matching.pair(i, j, Some(RenameReason::Fingerprint));
            }
        }

        let pairs: Vec<Option<(usize, Option<RenameReason>)>> =
            (0..from.len()).map(|i| matching.get(i)).collect();

        let columns: Vec<Option<ColumnsDiff<'a>>> = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                pair.map(|(j, _)| {
                    ColumnsDiff::from(cx, &from[i].name, &from[i].columns, &to[j].columns)
                })
            })
            .collect();

        let cmp = ConstraintCx {
            from,
            to,
            pairs: &pairs,
            columns: &columns,
        };

        let mut altered = vec![];
        for (i, pair) in pairs.iter().enumerate() {
            let Some((j, reason)) = *pair else { continue };
            let (from, to) = (&from[i], &to[j]);
            if from.excluded_from_migrations || to.excluded_from_migrations {
                continue;
            }
            let Some(table_columns) = &columns[i] else {
                continue;
            };
            let indices =
                IndicesDiff::from(cx, &from.name, table_columns, &from.indices, &to.indices);
            let changes = cmp.changes(i, j);
            let data = RowsDiff::from(from, to, table_columns);
            altered.push((i, j, reason, indices, changes, data));
        }

        let mut columns = columns;
        let mut items = vec![];

        for (i, table) in from.iter().enumerate() {
            if pairs[i].is_none() && !table.excluded_from_migrations {
                debug!(table = %table.name, "dropping table");
                items.push(TablesDiffItem::DropTable(table));
            }
        }

        for (i, j, reason, indices, changes, data) in altered {
            let (from, to) = (&from[i], &to[j]);
            let Some(columns) = columns[i].take() else {
                continue;
            };
            let rename = (from.name != to.name).then(|| reason.unwrap_or(RenameReason::Hint));
            if let Some(reason) = rename.filter(|r| r.is_heuristic()) {
                info!(
                    from = %from.name,
                    to = %to.name,
                    reason = reason.describe(),
                    "table rename detected"
                );
            }
            let comment = from.comment != to.comment || from.annotations != to.annotations;

            if rename.is_some()
                || comment
                || !columns.is_empty()
                || !indices.is_empty()
                || !changes.is_empty()
                || !data.is_empty()
            {
                items.push(TablesDiffItem::AlterTable {
                    from,
                    to,
                    rename,
                    comment,
                    columns,
                    indices,
                    changes,
                    data,
                });
            }
        }

        for j in matching.untaken() {
            let table = &to[j];
            if !table.excluded_from_migrations {
                debug!(table = %table.name, "creating table");
                items.push(TablesDiffItem::CreateTable(table));
            }
        }

        Self { items }
    }

    pub fn items(&self) -> &[TablesDiffItem<'a>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub enum TablesDiffItem<'a> {
    CreateTable(&'a Table),
    DropTable(&'a Table),
    AlterTable {
        from: &'a Table,
        to: &'a Table,

        /// Set when the table was renamed
        rename: Option<RenameReason>,

        /// Comment or annotations changed
        comment: bool,

        columns: ColumnsDiff<'a>,
        indices: IndicesDiff<'a>,
        changes: Vec<TableChange<'a>>,
        data: RowsDiff<'a>,
    },
}

/// Constraint changes of one matched table. Constraints are never altered
/// in place: a changed constraint is dropped and added again.
#[derive(Debug)]
pub enum TableChange<'a> {
    DropPrimaryKey(&'a PrimaryKey),
    AddPrimaryKey(&'a PrimaryKey),
    DropUniqueConstraint(&'a UniqueConstraint),
    AddUniqueConstraint(&'a UniqueConstraint),
    DropForeignKey(&'a ForeignKey),
    AddForeignKey(&'a ForeignKey),
    DropCheckConstraint(&'a CheckConstraint),
    AddCheckConstraint(&'a CheckConstraint),
    DropTrigger(&'a Trigger),
    AddTrigger(&'a Trigger),
}

/// Compares constraints of matched tables, translating previous columns
/// and tables to their next counterparts.
struct ConstraintCx<'a, 'b> {
    from: &'a [Table],
    to: &'a [Table],
    pairs: &'b [Option<(usize, Option<RenameReason>)>],
    columns: &'b [Option<ColumnsDiff<'a>>],
}

impl<'a> ConstraintCx<'a, '_> {
    fn pair(&self, i: usize) -> Option<usize> {
        self.pairs.get(i).copied().flatten().map(|(j, _)| j)
    }

    fn renamed(&self, i: usize) -> bool {
        self.pair(i)
            .is_some_and(|j| self.from[i].name != self.to[j].name)
    }

    fn same_columns(&self, table: usize, from: &[ColumnId], to: &[ColumnId]) -> bool {
        let Some(Some(columns)) = self.columns.get(table) else {
            return false;
        };
        from.len() == to.len()
            && from
                .iter()
                .zip(to)
                .all(|(f, t)| columns.matched(f.index) == Some(t.index))
    }

    fn changes(&self, i: usize, j: usize) -> Vec<TableChange<'a>> {
        let (from, to) = (&self.from[i], &self.to[j]);
        let renamed = self.renamed(i);
        let mut changes = vec![];

        // Constraint names derive from the table name; a renamed table keeps
        // its constraints.
        let same_name = |a: &str, b: &str| renamed || a == b;

        match (&from.primary_key, &to.primary_key) {
            (Some(f), Some(t)) => {
                let same = same_name(&f.name, &t.name)
                    && self.same_columns(i, &f.columns, &t.columns)
                    && f.annotations == t.annotations;
                if !same {
                    changes.push(TableChange::DropPrimaryKey(f));
                    changes.push(TableChange::AddPrimaryKey(t));
                }
            }
            (Some(f), None) => changes.push(TableChange::DropPrimaryKey(f)),
            (None, Some(t)) => changes.push(TableChange::AddPrimaryKey(t)),
            (None, None) => {}
        }

        let same_unique = |f: &UniqueConstraint, t: &UniqueConstraint| {
            same_name(&f.name, &t.name)
                && self.same_columns(i, &f.columns, &t.columns)
                && f.annotations == t.annotations
        };
        diff_by(
            &from.unique_constraints,
            &to.unique_constraints,
            same_unique,
            &mut changes,
            TableChange::DropUniqueConstraint,
            TableChange::AddUniqueConstraint,
        );

        let same_fk = |f: &ForeignKey, t: &ForeignKey| {
            let principal = f.principal.0;
            (renamed || self.renamed(principal) || f.name == t.name)
                && self.pair(principal) == Some(t.principal.0)
                && self.same_columns(i, &f.columns, &t.columns)
                && self.same_columns(principal, &f.principal_columns, &t.principal_columns)
                && f.on_delete == t.on_delete
                && f.annotations == t.annotations
        };
        diff_by(
            &from.foreign_keys,
            &to.foreign_keys,
            same_fk,
            &mut changes,
            TableChange::DropForeignKey,
            TableChange::AddForeignKey,
        );

        diff_by(
            &from.check_constraints,
            &to.check_constraints,
            |f, t| f == t,
            &mut changes,
            TableChange::DropCheckConstraint,
            TableChange::AddCheckConstraint,
        );

        diff_by(
            &from.triggers,
            &to.triggers,
            |f, t| f == t,
            &mut changes,
            TableChange::DropTrigger,
            TableChange::AddTrigger,
        );

        changes
    }
}

/// Pairs constraints with `same`; unpaired previous ones are dropped and
/// unpaired next ones added.
fn diff_by<'a, T>(
    from: &'a [T],
    to: &'a [T],
    same: impl Fn(&T, &T) -> bool,
    changes: &mut Vec<TableChange<'a>>,
    drop: fn(&'a T) -> TableChange<'a>,
    add: fn(&'a T) -> TableChange<'a>,
) {
    let mut matching = Matching::new(from.len(), to.len());
    matching.pass(None, |i, j| same(&from[i], &to[j]));

    changes.extend(matching.unmatched_from().map(|i| drop(&from[i])));
    changes.extend(matching.untaken().map(|j| add(&to[j])));
}
