use crate::schema::app::{ComplexProperty, Property, Type, ValueGenerated};
use crate::schema::{ComputedColumn, DefaultValue, ObjectName, Value};

/// Configures one scalar property.
pub struct PropertyBuilder<'a> {
    property: &'a mut Property,
}

impl<'a> PropertyBuilder<'a> {
    pub(super) fn new(property: &'a mut Property) -> Self {
        Self { property }
    }

    pub fn is_required(&mut self) -> &mut Self {
        self.property.nullable = false;
        self
    }

    pub fn is_nullable(&mut self) -> &mut Self {
        self.property.nullable = true;
        self
    }

    pub fn has_max_length(&mut self, max_length: u64) -> &mut Self {
        self.property.max_length = Some(max_length);
        self
    }

    pub fn is_fixed_length(&mut self) -> &mut Self {
        self.property.fixed_length = true;
        self
    }

    pub fn has_precision(&mut self, precision: u32) -> &mut Self {
        self.property.precision = Some(precision);
        self
    }

    pub fn has_scale(&mut self, scale: u32) -> &mut Self {
        self.property.scale = Some(scale);
        self
    }

    pub fn is_concurrency_token(&mut self) -> &mut Self {
        self.property.concurrency_token = true;
        self
    }

    pub fn value_generated(&mut self, value_generated: ValueGenerated) -> &mut Self {
        self.property.value_generated = value_generated;
        self.property.value_generated_explicit = true;
        self
    }

    pub fn value_generated_never(&mut self) -> &mut Self {
        self.value_generated(ValueGenerated::Never)
    }

    pub fn value_generated_on_add(&mut self) -> &mut Self {
        self.value_generated(ValueGenerated::OnAdd)
    }

    pub fn value_generated_on_update(&mut self) -> &mut Self {
        self.value_generated(ValueGenerated::OnUpdate)
    }

    pub fn value_generated_on_add_or_update(&mut self) -> &mut Self {
        self.value_generated(ValueGenerated::OnAddOrUpdate)
    }

    pub fn has_default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.property.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn has_default_value_sql(&mut self, sql: &str) -> &mut Self {
        self.property.default = Some(DefaultValue::Sql(sql.to_string()));
        self
    }

    pub fn has_computed_column_sql(&mut self, sql: &str, stored: bool) -> &mut Self {
        self.property.computed = Some(ComputedColumn {
            sql: sql.to_string(),
            stored,
        });
        self
    }

    pub fn has_column_name(&mut self, name: &str) -> &mut Self {
        self.property.column_name = Some(name.to_string());
        self
    }

    /// Store type written verbatim, bypassing the type mapping.
    pub fn has_column_type(&mut self, ty: &str) -> &mut Self {
        self.property.column_type = Some(ty.to_string());
        self
    }

    /// Draws values from a sequence declared with
    /// [`ModelBuilder::has_sequence`](super::ModelBuilder::has_sequence).
    pub fn use_sequence(&mut self, name: &str, schema: Option<&str>) -> &mut Self {
        self.property.sequence = Some(ObjectName::with_schema(name, schema));
        self
    }

    pub fn has_comment(&mut self, comment: &str) -> &mut Self {
        self.property.comment = Some(comment.to_string());
        self
    }

    pub fn use_collation(&mut self, collation: &str) -> &mut Self {
        self.property.collation = Some(collation.to_string());
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.property.annotations.set(key, value);
        self
    }
}

/// Configures a complex property: a bag of columns flattened into the
/// owning table.
pub struct ComplexPropertyBuilder<'a> {
    complex: &'a mut ComplexProperty,
}

impl<'a> ComplexPropertyBuilder<'a> {
    pub(super) fn new(complex: &'a mut ComplexProperty) -> Self {
        Self { complex }
    }

    pub fn is_required(&mut self) -> &mut Self {
        self.complex.required = true;
        self
    }

    pub fn property(&mut self, name: &str, ty: Type) -> PropertyBuilder<'_> {
        let properties = &mut self.complex.properties;
        let index = match properties.iter().position(|p| p.name == name) {
            Some(index) => {
                properties[index].ty = ty;
                index
            }
            None => {
                properties.push(Property::new(name, ty));
                properties.len() - 1
            }
        };
        PropertyBuilder::new(&mut properties[index])
    }

    pub fn complex_property(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut ComplexPropertyBuilder<'_>),
    ) -> &mut Self {
        let nested = &mut self.complex.complex_properties;
        let index = match nested.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                nested.push(ComplexProperty::new(name));
                nested.len() - 1
            }
        };
        f(&mut ComplexPropertyBuilder::new(&mut nested[index]));
        self
    }
}
