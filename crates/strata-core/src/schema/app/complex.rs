use super::Property;

/// A property bag without identity, flattened into the columns of its
/// owner. Column names default to `{Complex}_{Property}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexProperty {
    pub name: String,

    /// When `false`, every column of the bag is nullable
    pub required: bool,

    pub properties: Vec<Property>,

    pub complex_properties: Vec<ComplexProperty>,
}

impl ComplexProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            properties: vec![],
            complex_properties: vec![],
        }
    }
}
