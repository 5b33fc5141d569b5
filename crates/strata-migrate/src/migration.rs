use crate::operation::Operation;
use crate::sort::Plan;

use strata_core::schema::db::{
    ColumnsDiffItem, IndicesDiffItem, Rename, RoutinesDiffItem, RowsDiffItem, SchemaDiff,
    SequencesDiffItem, Table, TableChange, TablesDiffItem,
};
use tracing::{debug, info};

/// The ordered operations turning one relational model into another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Migration {
    pub operations: Vec<Operation>,

    /// Renames the differ chose, so callers can warn about heuristic ones
    pub renames: Vec<Rename>,
}

impl Migration {
    pub fn from_diff(diff: &SchemaDiff<'_>) -> Self {
        let next = diff.next();
        let mut plan = Plan::default();

        for schema in diff.schemas() {
            plan.ensure_schemas.push(Operation::ensure_schema(schema));
        }

        if diff.annotations_changed() {
            plan.alter_database.push(Operation::alter_database(
                &diff.previous().annotations,
                &next.annotations,
            ));
        }

        for item in diff.sequences().items() {
            match item {
                SequencesDiffItem::CreateSequence(sequence) => {
                    plan.create_sequences.push(Operation::create_sequence(sequence))
                }
                SequencesDiffItem::DropSequence(sequence) => {
                    plan.drop_sequences.push(Operation::drop_sequence(sequence))
                }
                SequencesDiffItem::RenameSequence { from, to, .. } => plan
                    .rename_sequences
                    .push(Operation::rename_sequence(from, to)),
                SequencesDiffItem::AlterSequence { from, to } => plan
                    .alter_sequences
                    .push(Operation::alter_sequence(from, to)),
                SequencesDiffItem::RestartSequence { to, .. } => plan
                    .alter_sequences
                    .push(Operation::restart_sequence(to)),
            }
        }

        let mut created = vec![];
        let mut dropped = vec![];

        for item in diff.tables().items() {
            match item {
                TablesDiffItem::CreateTable(table) => {
                    created.push(*table);
                    for index in &table.indices {
                        plan.add_indices.push(Operation::add_index(table, index));
                    }
                    for trigger in &table.triggers {
                        plan.add_triggers.push(Operation::add_trigger(table, trigger));
                    }
                }
                TablesDiffItem::DropTable(table) => dropped.push(*table),
                TablesDiffItem::AlterTable {
                    from,
                    to,
                    rename,
                    comment,
                    columns,
                    indices,
                    changes,
                    data,
                } => {
                    if rename.is_some() {
                        plan.rename_tables.push(Operation::rename_table(from, to));
                    }
                    if *comment {
                        plan.alter_tables.push(Operation::alter_table(from, to));
                    }

                    for item in columns.items() {
                        match item {
                            ColumnsDiffItem::AddColumn(column) => {
                                let op = Operation::add_column(to, column);
                                if column.computed.is_some() {
                                    plan.computed_columns.push(op);
                                } else {
                                    plan.columns.push(op);
                                }
                            }
                            ColumnsDiffItem::DropColumn(column) => {
                                plan.drop_columns.push(Operation::drop_column(from, column))
                            }
                            ColumnsDiffItem::AlterColumn { from: old, to: new } => {
                                let op = Operation::alter_column(to, old, new);
                                if op.is_destructive() {
                                    info!(table = %to.name, column = %new.name, "column change may lose data");
                                }
                                if new.computed.is_some() {
                                    plan.computed_columns.push(op);
                                } else {
                                    plan.columns.push(op);
                                }
                            }
                            ColumnsDiffItem::RenameColumn { from: old, to: new, .. } => plan
                                .rename_columns
                                .push(Operation::rename_column(to, old, new)),
                        }
                    }

                    for item in indices.items() {
                        match item {
                            IndicesDiffItem::CreateIndex(index) => {
                                plan.add_indices.push(Operation::add_index(to, index))
                            }
                            IndicesDiffItem::DropIndex(index) => {
                                plan.drop_indices.push(Operation::drop_index(from, index))
                            }
                            IndicesDiffItem::RenameIndex { from: old, to: new } => plan
                                .rename_indices
                                .push(Operation::rename_index(to, old, new)),
                        }
                    }

                    plan.table_changes(diff, from, to, changes);

                    for item in data.items() {
                        match item {
                            RowsDiffItem::Insert(row) => {
                                plan.insert_data.push(Operation::insert_data(to, row))
                            }
                            RowsDiffItem::Delete(row) => {
                                plan.delete_data.push(Operation::delete_data(from, row))
                            }
                            RowsDiffItem::Update { to: row, columns, .. } => plan
                                .insert_data
                                .push(Operation::update_data(to, row, columns)),
                        }
                    }
                }
            }
        }

        plan.drop_tables(&dropped);
        plan.create_tables(next, &created);

        for item in diff.views().items() {
            match item {
                RoutinesDiffItem::Create(view) => plan.create_views.push(Operation::create_view(view)),
                RoutinesDiffItem::Drop(view) => plan.drop_views.push(Operation::drop_view(view)),
            }
        }

        for item in diff.functions().items() {
            match item {
                RoutinesDiffItem::Create(function) => plan
                    .create_functions
                    .push(Operation::create_function(function)),
                RoutinesDiffItem::Drop(function) => {
                    plan.drop_functions.push(Operation::drop_function(function))
                }
            }
        }

        for item in diff.procedures().items() {
            match item {
                RoutinesDiffItem::Create(procedure) => plan
                    .create_procedures
                    .push(Operation::create_stored_procedure(procedure)),
                RoutinesDiffItem::Drop(procedure) => plan
                    .drop_procedures
                    .push(Operation::drop_stored_procedure(procedure)),
            }
        }

        let operations = plan.into_operations();
        debug!(operations = operations.len(), "computed migration");

        Self {
            operations,
            renames: diff.renames(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// `true` when some operation may lose data.
    pub fn is_destructive(&self) -> bool {
        self.operations.iter().any(Operation::is_destructive)
    }
}

impl Plan {
    /// Constraint changes of a matched table. Dropped constraints are
    /// named as in `from`, added ones as in `to`.
    fn table_changes(
        &mut self,
        diff: &SchemaDiff<'_>,
        from: &Table,
        to: &Table,
        changes: &[TableChange<'_>],
    ) {
        for change in changes {
            match change {
                TableChange::DropPrimaryKey(key) => self
                    .drop_primary_keys
                    .push(Operation::drop_primary_key(from, key)),
                TableChange::AddPrimaryKey(key) => self
                    .add_primary_keys
                    .push(Operation::add_primary_key(to, key)),
                TableChange::DropUniqueConstraint(key) => self
                    .drop_unique_constraints
                    .push(Operation::drop_unique_constraint(from, key)),
                TableChange::AddUniqueConstraint(key) => self
                    .add_unique_constraints
                    .push(Operation::add_unique_constraint(to, key)),
                TableChange::DropForeignKey(fk) => self
                    .drop_foreign_keys
                    .push(Operation::drop_foreign_key(from, fk)),
                TableChange::AddForeignKey(fk) => self
                    .add_foreign_keys
                    .push(Operation::add_foreign_key(diff.next(), to, fk)),
                TableChange::DropCheckConstraint(check) => self
                    .drop_check_constraints
                    .push(Operation::drop_check_constraint(from, check)),
                TableChange::AddCheckConstraint(check) => self
                    .add_check_constraints
                    .push(Operation::add_check_constraint(to, check)),
                TableChange::DropTrigger(trigger) => self
                    .drop_triggers
                    .push(Operation::drop_trigger(from, trigger)),
                TableChange::AddTrigger(trigger) => {
                    self.add_triggers.push(Operation::add_trigger(to, trigger))
                }
            }
        }
    }
}
