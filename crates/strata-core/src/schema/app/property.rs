use super::{EntityTypeId, Type};
use crate::schema::{Annotations, ComputedColumn, DefaultValue, ObjectName};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Uniquely identifies the property within the model. Members of complex
    /// properties carry a placeholder; they are addressed by path instead.
    pub id: PropertyId,

    pub name: String,

    /// Logical type
    pub ty: Type,

    pub nullable: bool,

    pub value_generated: ValueGenerated,

    /// `true` when `value_generated` was set explicitly rather than implied
    /// by a default or computed value
    pub value_generated_explicit: bool,

    pub max_length: Option<u64>,

    pub fixed_length: bool,

    pub precision: Option<u32>,

    pub scale: Option<u32>,

    pub concurrency_token: bool,

    pub default: Option<DefaultValue>,

    pub computed: Option<ComputedColumn>,

    /// Column name in every store object, unless overridden per object
    pub column_name: Option<String>,

    /// Explicit store type, taken verbatim
    pub column_type: Option<String>,

    /// Per store object column names (split fragments)
    pub overrides: Vec<ColumnOverride>,

    /// Key values are drawn from this sequence
    pub sequence: Option<ObjectName>,

    pub comment: Option<String>,

    pub collation: Option<String>,

    pub annotations: Annotations,
}

/// When the store generates a value for a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueGenerated {
    #[default]
    Never,
    OnAdd,
    OnUpdate,
    OnAddOrUpdate,
}

/// Column name used for a property in one particular store object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOverride {
    pub store: ObjectName,
    pub column_name: String,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId {
    pub entity: EntityTypeId,
    pub index: usize,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: Type) -> Property {
        Property {
            id: PropertyId::placeholder(),
            name: name.into(),
            ty,
            nullable: Property::default_nullable(ty),
            value_generated: ValueGenerated::Never,
            value_generated_explicit: false,
            max_length: None,
            fixed_length: false,
            precision: None,
            scale: None,
            concurrency_token: false,
            default: None,
            computed: None,
            column_name: None,
            column_type: None,
            overrides: vec![],
            sequence: None,
            comment: None,
            collation: None,
            annotations: Annotations::new(),
        }
    }

    /// A property holding references to this one: the same type and storage
    /// facets under a new name.
    pub fn referencing(&self, name: impl Into<String>) -> Property {
        Property {
            max_length: self.max_length,
            fixed_length: self.fixed_length,
            precision: self.precision,
            scale: self.scale,
            column_type: self.column_type.clone(),
            ..Property::new(name, self.ty)
        }
    }

    /// Reference-like types (strings, byte arrays, documents) are optional
    /// unless configured otherwise; everything else is required.
    pub fn default_nullable(ty: Type) -> bool {
        matches!(ty, Type::String | Type::Bytes | Type::Json)
    }

    /// The column name used in `store`, before any naming conventions from
    /// ownership or complex types apply.
    pub fn column_name_in(&self, store: &ObjectName) -> Option<&str> {
        self.overrides
            .iter()
            .find(|o| &o.store == store)
            .map(|o| o.column_name.as_str())
            .or(self.column_name.as_deref())
    }

    /// The generation mode the store applies, taking implied generation from
    /// defaults and computed columns into account.
    pub fn effective_value_generated(&self) -> ValueGenerated {
        if self.value_generated != ValueGenerated::Never {
            return self.value_generated;
        }
        if self.computed.is_some() {
            ValueGenerated::OnAddOrUpdate
        } else if self.default.is_some() || self.sequence.is_some() {
            ValueGenerated::OnAdd
        } else {
            ValueGenerated::Never
        }
    }
}

impl ValueGenerated {
    pub fn on_add(self) -> bool {
        matches!(self, ValueGenerated::OnAdd | ValueGenerated::OnAddOrUpdate)
    }

    /// Name of the variant as written in snapshots.
    pub fn name(self) -> &'static str {
        match self {
            ValueGenerated::Never => "Never",
            ValueGenerated::OnAdd => "OnAdd",
            ValueGenerated::OnUpdate => "OnUpdate",
            ValueGenerated::OnAddOrUpdate => "OnAddOrUpdate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            ValueGenerated::Never,
            ValueGenerated::OnAdd,
            ValueGenerated::OnUpdate,
            ValueGenerated::OnAddOrUpdate,
        ]
        .into_iter()
        .find(|value_generated| value_generated.name() == name)
    }
}

impl PropertyId {
    pub(crate) fn placeholder() -> Self {
        Self {
            entity: EntityTypeId::placeholder(),
            index: usize::MAX,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.index == usize::MAX
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "PropertyId({}/{})", self.entity.0, self.index)
    }
}
