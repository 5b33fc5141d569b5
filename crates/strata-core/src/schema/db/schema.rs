use super::{
    Column, ColumnId, DiffContext, Function, FunctionId, Index, IndexId, ProcedureId, Rename,
    RenameHints, RenameKind, RenameReason, Routine, RoutinesDiff, Sequence, SequenceId,
    SequencesDiff, SequencesDiffItem, StoreObjectId, StoredProcedure, Table, TableId, TablesDiff,
    TablesDiffItem, View, ViewId,
};
use super::{ColumnsDiffItem, IndicesDiffItem};
use crate::schema::{Annotations, ObjectName};

use std::collections::BTreeSet;

/// The relational model: every store object an application's entity types
/// are mapped to.
///
/// Object IDs are positions in the owning `Vec`.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    /// Schema applied to objects that do not name one
    pub default_schema: Option<String>,

    pub tables: Vec<Table>,

    pub views: Vec<View>,

    pub functions: Vec<Function>,

    pub procedures: Vec<StoredProcedure>,

    pub sequences: Vec<Sequence>,

    /// Database-wide annotations
    pub annotations: Annotations,
}

impl Schema {
    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        let id = id.into();
        let columns = match id.store {
            StoreObjectId::Table(table) => &self.table(table).columns,
            StoreObjectId::View(view) => &self.view(view).columns,
            StoreObjectId::Function(function) => &self.function(function).columns,
            StoreObjectId::StoredProcedure(procedure) => &self.procedure(procedure).result_columns,
        };
        columns.get(id.index).expect("invalid column ID")
    }

    // NOTE: this is unlikely to confuse users given the context.
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, id: IndexId) -> &Index {
        self.table(id.table)
            .indices
            .get(id.index)
            .expect("invalid index ID")
    }

    pub fn table(&self, id: impl Into<TableId>) -> &Table {
        self.tables.get(id.into().0).expect("invalid table ID")
    }

    pub fn view(&self, id: ViewId) -> &View {
        self.views.get(id.0).expect("invalid view ID")
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        self.functions.get(id.0).expect("invalid function ID")
    }

    pub fn procedure(&self, id: ProcedureId) -> &StoredProcedure {
        self.procedures.get(id.0).expect("invalid procedure ID")
    }

    pub fn sequence(&self, id: SequenceId) -> &Sequence {
        self.sequences.get(id.0).expect("invalid sequence ID")
    }

    pub fn find_table(&self, name: impl Into<ObjectName>) -> Option<&Table> {
        let name = name.into();
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn find_view(&self, name: impl Into<ObjectName>) -> Option<&View> {
        let name = name.into();
        self.views.iter().find(|v| v.name == name)
    }

    pub fn find_sequence(&self, name: impl Into<ObjectName>) -> Option<&Sequence> {
        let name = name.into();
        self.sequences.iter().find(|s| s.name == name)
    }

    /// Schemas holding objects that migrations manage.
    pub fn schemas(&self) -> BTreeSet<&str> {
        let tables = self
            .tables
            .iter()
            .filter(|t| !t.excluded_from_migrations)
            .map(|t| &t.name);
        let routines = self
            .views
            .iter()
            .filter(|v| v.is_managed())
            .map(|v| &v.name)
            .chain(self.functions.iter().filter(|f| f.is_managed()).map(|f| &f.name))
            .chain(self.procedures.iter().filter(|p| p.is_managed()).map(|p| &p.name));
        let sequences = self.sequences.iter().map(|s| &s.name);

        tables
            .chain(routines)
            .chain(sequences)
            .filter_map(|name| name.schema.as_deref())
            .collect()
    }
}

/// Everything that differs between two relational models.
pub struct SchemaDiff<'a> {
    previous: &'a Schema,
    next: &'a Schema,
    schemas: Vec<&'a str>,
    annotations: bool,
    sequences: SequencesDiff<'a>,
    tables: TablesDiff<'a>,
    views: RoutinesDiff<'a, View>,
    functions: RoutinesDiff<'a, Function>,
    procedures: RoutinesDiff<'a, StoredProcedure>,
}

impl<'a> SchemaDiff<'a> {
    pub fn from(from: &'a Schema, to: &'a Schema, rename_hints: &'a RenameHints) -> Self {
        let cx = &DiffContext::new(from, to, rename_hints);

        let existing = from.schemas();
        let schemas = to
            .schemas()
            .into_iter()
            .filter(|schema| !existing.contains(schema))
            .collect();

        Self {
            previous: from,
            next: to,
            schemas,
            annotations: from.annotations != to.annotations,
            sequences: SequencesDiff::from(cx, &from.sequences, &to.sequences),
            tables: TablesDiff::from(cx, &from.tables, &to.tables),
            views: RoutinesDiff::from(&from.views, &to.views),
            functions: RoutinesDiff::from(&from.functions, &to.functions),
            procedures: RoutinesDiff::from(&from.procedures, &to.procedures),
        }
    }

    /// Schemas used by the next model but not the previous one.
    pub fn schemas(&self) -> &[&'a str] {
        &self.schemas
    }

    /// `true` when database-wide annotations changed.
    pub fn annotations_changed(&self) -> bool {
        self.annotations
    }

    pub fn sequences(&self) -> &SequencesDiff<'a> {
        &self.sequences
    }

    pub fn tables(&self) -> &TablesDiff<'a> {
        &self.tables
    }

    pub fn views(&self) -> &RoutinesDiff<'a, View> {
        &self.views
    }

    pub fn functions(&self) -> &RoutinesDiff<'a, Function> {
        &self.functions
    }

    pub fn procedures(&self) -> &RoutinesDiff<'a, StoredProcedure> {
        &self.procedures
    }

    /// Every rename the diff contains, with the reason it was chosen.
    pub fn renames(&self) -> Vec<Rename> {
        let mut renames = vec![];

        for item in self.sequences.items() {
            if let SequencesDiffItem::RenameSequence { from, to, reason } = item {
                renames.push(Rename {
                    kind: RenameKind::Sequence,
                    table: None,
                    from: from.name.clone(),
                    to: to.name.clone(),
                    reason: *reason,
                });
            }
        }

        for item in self.tables.items() {
            let TablesDiffItem::AlterTable {
                from,
                to,
                rename,
                columns,
                indices,
                ..
            } = item
            else {
                continue;
            };

            if let Some(reason) = rename {
                renames.push(Rename {
                    kind: RenameKind::Table,
                    table: None,
                    from: from.name.clone(),
                    to: to.name.clone(),
                    reason: *reason,
                });
            }

            for item in columns.items() {
                if let ColumnsDiffItem::RenameColumn { from, to: column, reason } = item {
                    renames.push(Rename {
                        kind: RenameKind::Column,
                        table: Some(to.name.clone()),
                        from: ObjectName::new(&from.name),
                        to: ObjectName::new(&column.name),
                        reason: *reason,
                    });
                }
            }

            for item in indices.items() {
                if let IndicesDiffItem::RenameIndex { from, to: index } = item {
                    renames.push(Rename {
                        kind: RenameKind::Index,
                        table: Some(to.name.clone()),
                        from: ObjectName::new(&from.name),
                        to: ObjectName::new(&index.name),
                        reason: RenameReason::SameColumns,
                    });
                }
            }
        }

        renames
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && !self.annotations
            && self.sequences.is_empty()
            && self.tables.is_empty()
            && self.views.is_empty()
            && self.functions.is_empty()
            && self.procedures.is_empty()
    }

    pub fn previous(&self) -> &'a Schema {
        self.previous
    }

    pub fn next(&self) -> &'a Schema {
        self.next
    }
}
