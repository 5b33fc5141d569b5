mod column;
pub use column::{Column, ColumnId, ColumnMapping, ColumnsDiff, ColumnsDiffItem};

mod constraint;
pub use constraint::{CheckConstraint, Trigger};

mod data;
pub use data::{Row, RowsDiff, RowsDiffItem};

mod diff;
pub use diff::{DiffContext, Rename, RenameHints, RenameKind, RenameReason};

mod fk;
pub use fk::ForeignKey;

mod index;
pub use index::{Index, IndexColumn, IndexId, IndicesDiff, IndicesDiffItem};

mod pk;
pub use pk::{PrimaryKey, UniqueConstraint};

mod routine;
pub use routine::{
    Function, FunctionId, Parameter, ProcedureId, Routine, RoutinesDiff, RoutinesDiffItem,
    StoredProcedure, View, ViewId,
};

mod schema;
pub use schema::{Schema, SchemaDiff};

mod sequence;
pub use sequence::{Sequence, SequenceId, SequencesDiff, SequencesDiffItem};

mod store;
pub use store::StoreObjectId;

mod table;
pub use table::{Table, TableChange, TableId, TablesDiff, TablesDiffItem};

mod ty;
pub use ty::{Facets, Type};
