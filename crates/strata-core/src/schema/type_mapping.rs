//! Default store types per logical type.
//!
//! The table is built once, on first use, and shared read-only by every
//! projection running in the process.

use super::{app, db};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

static DEFAULTS: Lazy<IndexMap<app::Type, db::Type>> = Lazy::new(|| {
    tracing::trace!("initializing default type mappings");
    app::Type::ALL
        .into_iter()
        .map(|ty| (ty, base_type(ty)))
        .collect()
});

/// The process-wide default mapping table.
pub fn defaults() -> &'static IndexMap<app::Type, db::Type> {
    &DEFAULTS
}

fn base_type(ty: app::Type) -> db::Type {
    match ty {
        app::Type::Bool => db::Type::Boolean,
        app::Type::I16 => db::Type::Integer(2),
        app::Type::I32 => db::Type::Integer(4),
        app::Type::I64 => db::Type::Integer(8),
        app::Type::U8 => db::Type::UnsignedInteger(1),
        app::Type::F32 => db::Type::Float(4),
        app::Type::F64 => db::Type::Float(8),
        app::Type::Decimal => db::Type::Numeric(None),
        app::Type::String => db::Type::Text,
        app::Type::Bytes => db::Type::Blob,
        app::Type::Uuid => db::Type::Uuid,
        app::Type::Date => db::Type::Date,
        app::Type::Time => db::Type::Time(7),
        app::Type::DateTime => db::Type::DateTime(7),
        app::Type::DateTimeOffset => db::Type::Timestamp(7),
        app::Type::Json => db::Type::Json,
    }
}

/// Store-type knobs a projection runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTypes {
    /// The default storage type for a string without a max length.
    pub default_string_type: db::Type,

    /// When `Some` the store supports varchar types with the specified upper
    /// limit.
    pub varchar: Option<u64>,
}

impl StorageTypes {
    pub const DEFAULT: StorageTypes = StorageTypes {
        default_string_type: db::Type::Text,
        varchar: Some(1_000_000_000),
    };

    pub(crate) fn default_for(&self, ty: app::Type) -> db::Type {
        match ty {
            app::Type::String => self.default_string_type.clone(),
            _ => defaults()
                .get(&ty)
                .cloned()
                .unwrap_or_else(|| base_type(ty)),
        }
    }
}

impl Default for StorageTypes {
    fn default() -> Self {
        Self::DEFAULT
    }
}
