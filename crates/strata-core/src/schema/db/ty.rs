use crate::schema::{app, type_mapping::StorageTypes};
use crate::Result;

use std::fmt;

/// Store-level type of a column, parameter or sequence.
///
/// Two property mappings contributing to one column must resolve to the
/// same `Type`; this is the unit of comparison for column aggregation and
/// for detecting `AlterColumn` changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// A boolean value
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// An unsigned integer of `n` bytes
    UnsignedInteger(u8),

    /// A floating point number of `n` bytes
    Float(u8),

    /// Decimal number with optional precision and scale.
    /// - `None`: Arbitrary-precision decimal
    /// - `Some((precision, scale))`: Fixed precision and scale
    Numeric(Option<(u32, u32)>),

    /// Unconstrained text type
    Text,

    /// Text type with an explicit maximum length
    VarChar(u64),

    /// Fixed-length text type
    Char(u64),

    /// Unconstrained binary type
    Blob,

    /// Binary type with an explicit maximum length
    VarBinary(u64),

    /// Fixed-size binary type of `n` bytes
    Binary(u64),

    /// 128-bit universally unique identifier (UUID)
    Uuid,

    /// A representation of a civil date in the Gregorian calendar.
    Date,

    /// Civil "wall clock" time with fractional seconds precision (0-9 digits).
    Time(u8),

    /// A civil datetime with fractional seconds precision (0-9 digits).
    DateTime(u8),

    /// An instant in time with an offset, fractional seconds precision (0-9 digits).
    Timestamp(u8),

    /// Structured document column
    Json,

    /// User-specified store type, taken verbatim
    Custom(String),
}

/// Property facets that refine the store type picked for a logical type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facets {
    pub max_length: Option<u64>,
    pub fixed_length: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl Type {
    /// Maps a logical type to a store type.
    ///
    /// `hint` is an explicit column type (`has_column_type`), which always
    /// wins. Otherwise the default for `ty` is refined by `facets`.
    pub fn from_app(
        ty: app::Type,
        hint: Option<&str>,
        facets: &Facets,
        storage: &StorageTypes,
    ) -> Result<Type> {
        if let Some(hint) = hint {
            if hint.trim().is_empty() {
                return Err(crate::Error::invalid_schema(
                    "column type override must not be empty",
                ));
            }
            return Ok(Type::Custom(hint.to_string()));
        }

        let base = storage.default_for(ty);

        Ok(match (ty, facets) {
            (app::Type::String, Facets { max_length: Some(len), fixed_length: true, .. }) => {
                Type::Char(*len)
            }
            (app::Type::String, Facets { max_length: Some(len), .. }) => {
                match storage.varchar {
                    Some(max) if *len > max => {
                        return Err(crate::Error::invalid_schema(format!(
                            "max length {len} exceeds the store maximum of {max}"
                        )))
                    }
                    _ => Type::VarChar(*len),
                }
            }
            (app::Type::Bytes, Facets { max_length: Some(len), fixed_length: true, .. }) => {
                Type::Binary(*len)
            }
            (app::Type::Bytes, Facets { max_length: Some(len), .. }) => Type::VarBinary(*len),
            (app::Type::Decimal, Facets { precision: Some(p), scale, .. }) => {
                let scale = scale.unwrap_or(0);
                if scale > *p {
                    return Err(crate::Error::invalid_schema(format!(
                        "scale {scale} exceeds precision {p}"
                    )));
                }
                Type::Numeric(Some((*p, scale)))
            }
            (
                app::Type::Time | app::Type::DateTime | app::Type::DateTimeOffset,
                Facets { precision: Some(p), .. },
            ) => {
                if *p > 9 {
                    return Err(crate::Error::invalid_schema(format!(
                        "fractional seconds precision {p} is out of range (0-9)"
                    )));
                }
                base.with_time_precision(*p as u8)
            }
            _ => base,
        })
    }

    fn with_time_precision(self, precision: u8) -> Type {
        match self {
            Type::Time(_) => Type::Time(precision),
            Type::DateTime(_) => Type::DateTime(precision),
            Type::Timestamp(_) => Type::Timestamp(precision),
            other => other,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer(_) | Type::UnsignedInteger(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => f.write_str("boolean"),
            Type::Integer(n) => write!(f, "integer({n})"),
            Type::UnsignedInteger(n) => write!(f, "unsigned integer({n})"),
            Type::Float(n) => write!(f, "float({n})"),
            Type::Numeric(None) => f.write_str("numeric"),
            Type::Numeric(Some((p, s))) => write!(f, "numeric({p}, {s})"),
            Type::Text => f.write_str("text"),
            Type::VarChar(n) => write!(f, "varchar({n})"),
            Type::Char(n) => write!(f, "char({n})"),
            Type::Blob => f.write_str("blob"),
            Type::VarBinary(n) => write!(f, "varbinary({n})"),
            Type::Binary(n) => write!(f, "binary({n})"),
            Type::Uuid => f.write_str("uuid"),
            Type::Date => f.write_str("date"),
            Type::Time(p) => write!(f, "time({p})"),
            Type::DateTime(p) => write!(f, "datetime({p})"),
            Type::Timestamp(p) => write!(f, "timestamp({p})"),
            Type::Json => f.write_str("json"),
            Type::Custom(s) => f.write_str(s),
        }
    }
}
