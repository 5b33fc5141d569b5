pub mod app;
pub use app::ModelBuilder;

mod annotation;
pub use annotation::Annotations;

pub mod builder;
pub use builder::Builder;

pub mod db;

mod diagnostic;
pub use diagnostic::{Diagnostic, Severity};

pub mod mapping;
pub use mapping::Mapping;

mod name;
pub use name::ObjectName;

pub mod type_mapping;

mod value;
pub use value::{ComputedColumn, DefaultValue, Opaque, Value};

mod verify;

use crate::Result;
use std::sync::Arc;

/// A finalized conceptual model together with its relational projection.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Conceptual model the projection was built from
    pub app: app::Model,

    /// Relational model
    pub db: Arc<db::Schema>,

    /// Maps entity types to the store objects they are stored in
    pub mapping: Mapping,

    /// Informational messages produced while projecting
    pub diagnostics: Vec<Diagnostic>,

    /// Options the projection ran with
    pub builder: Builder,
}

impl Schema {
    /// Projects `app` with the default [`Builder`] options.
    pub fn project(app: app::Model) -> Result<Schema> {
        Builder::new().build(app)
    }

    pub fn entity_type(&self, id: impl Into<app::EntityTypeId>) -> &app::EntityType {
        self.app.entity_type(id)
    }

    pub fn table(&self, id: impl Into<db::TableId>) -> &db::Table {
        self.db.table(id)
    }
}
