pub mod operation;
pub use operation::Operation;

mod migration;
pub use migration::Migration;

mod sort;

use strata_core::schema::db::{RenameHints, Schema, SchemaDiff};

/// Computes the operations turning `previous` into `next`.
pub fn diff(previous: &Schema, next: &Schema) -> Migration {
    diff_with_hints(previous, next, &RenameHints::default())
}

/// Like [`diff`], pairing objects named in `hints` before any heuristic
/// runs.
pub fn diff_with_hints(previous: &Schema, next: &Schema, hints: &RenameHints) -> Migration {
    Migration::from_diff(&SchemaDiff::from(previous, next, hints))
}
