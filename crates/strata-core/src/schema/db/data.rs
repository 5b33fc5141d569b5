use super::{ColumnId, ColumnsDiff, Table};
use crate::schema::Value;

use tracing::debug;

/// A seed row of a table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    /// Values in column order. Columns left out take their default.
    pub values: Vec<(ColumnId, Value)>,
}

impl Row {
    pub fn get(&self, column: ColumnId) -> Option<&Value> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, value)| value)
    }

    /// Values of `columns`, or `None` when one is not set.
    pub fn values_of(&self, columns: &[ColumnId]) -> Option<Vec<&Value>> {
        columns.iter().map(|column| self.get(*column)).collect()
    }
}

/// Seed row changes of one matched table. Rows are paired by primary key
/// value; when the key itself changed every previous row is deleted and
/// every next row inserted.
pub struct RowsDiff<'a> {
    items: Vec<RowsDiffItem<'a>>,
}

#[derive(Debug)]
pub enum RowsDiffItem<'a> {
    Insert(&'a Row),
    Delete(&'a Row),
    Update {
        from: &'a Row,
        to: &'a Row,

        /// Columns of the next table whose value changed. A column the next
        /// row leaves out is reset to null.
        columns: Vec<ColumnId>,
    },
}

impl<'a> RowsDiff<'a> {
    pub fn from(from: &'a Table, to: &'a Table, columns: &ColumnsDiff<'a>) -> Self {
        let key = |table: &'a Table| -> &'a [ColumnId] {
            table
                .primary_key
                .as_ref()
                .map(|pk| pk.columns.as_slice())
                .unwrap_or(&[])
        };
        let (from_key, to_key) = (key(from), key(to));
        let same_key = !to_key.is_empty()
            && from_key.len() == to_key.len()
            && from_key
                .iter()
                .zip(to_key)
                .all(|(f, t)| columns.matched(f.index) == Some(t.index));

        let mut paired = vec![false; from.data.len()];
        let mut items = vec![];

        for row in &to.data {
            let previous = if same_key {
                let values = row.values_of(to_key);
                (0..from.data.len())
                    .find(|&i| !paired[i] && values.is_some() && from.data[i].values_of(from_key) == values)
            } else {
                None
            };

            let Some(i) = previous else {
                items.push(RowsDiffItem::Insert(row));
                continue;
            };
            paired[i] = true;

            let changed = changed_columns(&from.data[i], row, to, to_key, columns);
            if !changed.is_empty() {
                items.push(RowsDiffItem::Update {
                    from: &from.data[i],
                    to: row,
                    columns: changed,
                });
            }
        }

        for (i, row) in from.data.iter().enumerate() {
            if !paired[i] {
                items.push(RowsDiffItem::Delete(row));
            }
        }

        if !items.is_empty() {
            debug!(table = %to.name, changes = items.len(), "seed data changed");
        }
        Self { items }
    }

    pub fn items(&self) -> &[RowsDiffItem<'a>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Non-key columns of `to_table` whose value in `next` differs from the
/// value `previous` held in the matching previous column.
fn changed_columns(
    previous: &Row,
    next: &Row,
    to_table: &Table,
    key: &[ColumnId],
    columns: &ColumnsDiff<'_>,
) -> Vec<ColumnId> {
    to_table
        .columns
        .iter()
        .map(|column| column.id)
        .filter(|id| !key.contains(id))
        .filter(|id| {
            let old = previous
                .values
                .iter()
                .find(|(c, _)| columns.matched(c.index) == Some(id.index))
                .map(|(_, value)| value);
            old.unwrap_or(&Value::Null) != next.get(*id).unwrap_or(&Value::Null)
        })
        .collect()
}
