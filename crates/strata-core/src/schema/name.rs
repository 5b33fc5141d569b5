use std::fmt;

/// Name of a schema-scoped database object: table, view, function, stored
/// procedure or sequence.
///
/// A `schema` of `None` means the object lives in the database's default
/// schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectName {
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(name: impl Into<String>, schema: Option<impl Into<String>>) -> Self {
        Self {
            schema: schema.map(Into::into),
            name: name.into(),
        }
    }

    /// Returns a copy with the schema filled in from `default` when unset.
    pub fn or_schema(&self, default: Option<&str>) -> Self {
        Self {
            schema: self.schema.clone().or_else(|| default.map(String::from)),
            name: self.name.clone(),
        }
    }

    /// Compares names ignoring ASCII case, the way identifier lookup in most
    /// stores behaves.
    pub fn eq_ignore_case(&self, other: &ObjectName) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && match (&self.schema, &other.schema) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for ObjectName {
    fn from(value: &str) -> Self {
        ObjectName::new(value)
    }
}

impl From<String> for ObjectName {
    fn from(value: String) -> Self {
        ObjectName::new(value)
    }
}

impl PartialEq<str> for ObjectName {
    fn eq(&self, other: &str) -> bool {
        self.schema.is_none() && self.name == other
    }
}

impl PartialEq<&str> for ObjectName {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
