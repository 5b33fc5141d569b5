use std::fmt;

/// Logical type of a property, independent of how a store persists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Bool,
    I16,
    I32,
    I64,
    U8,
    F32,
    F64,
    Decimal,
    String,
    Bytes,
    Uuid,
    Date,
    Time,
    DateTime,
    DateTimeOffset,

    /// Structured document; the type of JSON container properties.
    Json,
}

impl Type {
    pub const ALL: [Type; 16] = [
        Type::Bool,
        Type::I16,
        Type::I32,
        Type::I64,
        Type::U8,
        Type::F32,
        Type::F64,
        Type::Decimal,
        Type::String,
        Type::Bytes,
        Type::Uuid,
        Type::Date,
        Type::Time,
        Type::DateTime,
        Type::DateTimeOffset,
        Type::Json,
    ];

    pub fn is_integer(self) -> bool {
        matches!(self, Type::I16 | Type::I32 | Type::I64 | Type::U8)
    }

    pub fn is_string(self) -> bool {
        matches!(self, Type::String)
    }

    /// Name of the variant as written in snapshots (`Type::I32`).
    pub fn name(self) -> &'static str {
        match self {
            Type::Bool => "Bool",
            Type::I16 => "I16",
            Type::I32 => "I32",
            Type::I64 => "I64",
            Type::U8 => "U8",
            Type::F32 => "F32",
            Type::F64 => "F64",
            Type::Decimal => "Decimal",
            Type::String => "String",
            Type::Bytes => "Bytes",
            Type::Uuid => "Uuid",
            Type::Date => "Date",
            Type::Time => "Time",
            Type::DateTime => "DateTime",
            Type::DateTimeOffset => "DateTimeOffset",
            Type::Json => "Json",
        }
    }

    pub fn from_name(name: &str) -> Option<Type> {
        Type::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
