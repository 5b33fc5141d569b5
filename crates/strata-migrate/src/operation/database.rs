use super::Operation;

use strata_core::schema::Annotations;

/// Creates a database schema if it does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsureSchema {
    pub name: String,
}

/// Replaces database-wide annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterDatabase {
    pub annotations: Annotations,
    pub old_annotations: Annotations,
}

impl Operation {
    pub fn ensure_schema(name: &str) -> Self {
        EnsureSchema {
            name: name.to_string(),
        }
        .into()
    }

    pub fn alter_database(from: &Annotations, to: &Annotations) -> Self {
        AlterDatabase {
            annotations: to.clone(),
            old_annotations: from.clone(),
        }
        .into()
    }
}

impl From<EnsureSchema> for Operation {
    fn from(value: EnsureSchema) -> Self {
        Self::EnsureSchema(value)
    }
}

impl From<AlterDatabase> for Operation {
    fn from(value: AlterDatabase) -> Self {
        Self::AlterDatabase(value)
    }
}
