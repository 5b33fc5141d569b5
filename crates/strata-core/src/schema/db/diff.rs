use super::Schema;
use crate::schema::ObjectName;

use std::collections::HashMap;
use std::fmt;

/// Renames supplied by the caller. They take precedence over every
/// heuristic.
///
/// Names are given as they appear in the previous and next
/// [`Schema`](super::Schema), schema-qualified when a schema applies.
/// Column and index hints are keyed by the previous table name.
#[derive(Debug, Default, Clone)]
pub struct RenameHints {
    tables: HashMap<ObjectName, ObjectName>,
    columns: HashMap<(ObjectName, String), String>,
    indices: HashMap<(ObjectName, String), String>,
    sequences: HashMap<ObjectName, ObjectName>,

    /// Columns that may differ between two tables still paired by
    /// fingerprint; `None` means one
    fingerprint_tolerance: Option<usize>,
}

impl RenameHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table_hint(&mut self, from: impl Into<ObjectName>, to: impl Into<ObjectName>) {
        self.tables.insert(from.into(), to.into());
    }

    pub fn add_column_hint(&mut self, table: impl Into<ObjectName>, from: &str, to: &str) {
        self.columns
            .insert((table.into(), from.to_string()), to.to_string());
    }

    pub fn add_index_hint(&mut self, table: impl Into<ObjectName>, from: &str, to: &str) {
        self.indices
            .insert((table.into(), from.to_string()), to.to_string());
    }

    pub fn add_sequence_hint(&mut self, from: impl Into<ObjectName>, to: impl Into<ObjectName>) {
        self.sequences.insert(from.into(), to.into());
    }

    /// Sets how many columns may differ (by name or type) for two
    /// otherwise unmatched tables to be treated as a rename.
    pub fn set_fingerprint_tolerance(&mut self, columns: usize) {
        self.fingerprint_tolerance = Some(columns);
    }

    pub fn fingerprint_tolerance(&self) -> usize {
        self.fingerprint_tolerance.unwrap_or(1)
    }

    pub fn get_table(&self, from: &ObjectName) -> Option<&ObjectName> {
        self.tables.get(from)
    }

    pub fn get_column(&self, table: &ObjectName, from: &str) -> Option<&str> {
        self.columns
            .get(&(table.clone(), from.to_string()))
            .map(String::as_str)
    }

    pub fn get_index(&self, table: &ObjectName, from: &str) -> Option<&str> {
        self.indices
            .get(&(table.clone(), from.to_string()))
            .map(String::as_str)
    }

    pub fn get_sequence(&self, from: &ObjectName) -> Option<&ObjectName> {
        self.sequences.get(from)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.columns.is_empty()
            && self.indices.is_empty()
            && self.sequences.is_empty()
    }
}

pub struct DiffContext<'a> {
    previous: &'a Schema,
    next: &'a Schema,

    rename_hints: &'a RenameHints,
}

impl<'a> DiffContext<'a> {
    pub fn new(previous: &'a Schema, next: &'a Schema, rename_hints: &'a RenameHints) -> Self {
        Self {
            previous,
            next,
            rename_hints,
        }
    }

    pub fn rename_hints(&self) -> &'a RenameHints {
        self.rename_hints
    }

    pub fn previous(&self) -> &'a Schema {
        self.previous
    }

    pub fn next(&self) -> &'a Schema {
        self.next
    }
}

/// A rename chosen by the differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub kind: RenameKind,

    /// Table holding the renamed column or index, by its new name
    pub table: Option<ObjectName>,

    pub from: ObjectName,

    pub to: ObjectName,

    pub reason: RenameReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameKind {
    Table,
    Column,
    Index,
    Sequence,
}

/// Why two objects with different names were paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameReason {
    /// Named in [`RenameHints`]
    Hint,

    /// Same name, different schema
    SchemaMoved,

    /// Both tables store a common entity type
    SharedEntityType,

    /// Same key and all but at most one column identical
    Fingerprint,

    /// Both columns store a common property
    SharedProperty,

    /// The only pair of columns with an identical definition
    SameDefinition,

    /// Same indexed columns, different index name
    SameColumns,
}

impl RenameReason {
    /// `true` for renames the caller did not ask for.
    pub fn is_heuristic(self) -> bool {
        !matches!(self, RenameReason::Hint)
    }

    pub fn describe(self) -> &'static str {
        match self {
            RenameReason::Hint => "rename hint",
            RenameReason::SchemaMoved => "moved to another schema",
            RenameReason::SharedEntityType => "shared entity type",
            RenameReason::Fingerprint => "matching columns",
            RenameReason::SharedProperty => "shared property",
            RenameReason::SameDefinition => "identical definition",
            RenameReason::SameColumns => "same indexed columns",
        }
    }
}

impl fmt::Display for RenameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenameKind::Table => "table",
            RenameKind::Column => "column",
            RenameKind::Index => "index",
            RenameKind::Sequence => "sequence",
        })
    }
}

impl fmt::Display for Rename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` renamed to `{}`", self.kind, self.from, self.to)?;
        if let Some(table) = &self.table {
            write!(f, " on `{table}`")?;
        }
        write!(f, " ({})", self.reason.describe())
    }
}

/// Pairs previous objects with next ones over a sequence of passes. Each
/// pass only considers objects left unpaired by the earlier ones, in
/// declaration order.
#[derive(Debug)]
pub(crate) struct Matching {
    matches: Vec<Option<usize>>,
    reasons: Vec<Option<RenameReason>>,
    taken: Vec<bool>,
}

impl Matching {
    pub(crate) fn new(from: usize, to: usize) -> Self {
        Self {
            matches: vec![None; from],
            reasons: vec![None; from],
            taken: vec![false; to],
        }
    }

    pub(crate) fn is_matched(&self, from: usize) -> bool {
        self.matches[from].is_some()
    }

    pub(crate) fn pair(&mut self, from: usize, to: usize, reason: Option<RenameReason>) {
        debug_assert!(self.matches[from].is_none() && !self.taken[to]);
        self.matches[from] = Some(to);
        self.reasons[from] = reason;
        self.taken[to] = true;
    }

    /// Pairs every unmatched `from` with the first untaken `to` accepted by
    /// `f`.
    pub(crate) fn pass(
        &mut self,
        reason: Option<RenameReason>,
        mut f: impl FnMut(usize, usize) -> bool,
    ) {
        for from in 0..self.matches.len() {
            if self.is_matched(from) {
                continue;
            }
            let to = (0..self.taken.len()).find(|to| !self.taken[*to] && f(from, *to));
            if let Some(to) = to {
                self.pair(from, to, reason);
            }
        }
    }

    pub(crate) fn get(&self, from: usize) -> Option<(usize, Option<RenameReason>)> {
        self.matches[from].map(|to| (to, self.reasons[from]))
    }

    pub(crate) fn unmatched_from(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.matches.len()).filter(|from| self.matches[*from].is_none())
    }

    pub(crate) fn untaken(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.taken.len()).filter(|to| !self.taken[*to])
    }

    pub(crate) fn into_matches(self) -> Vec<Option<usize>> {
        self.matches
    }
}
