use super::{EntityDecl, FragmentDecl, OwnershipDecl, ParameterDecl, ProcedureDecl};
use crate::schema::app::{CheckConstraint, ParameterDirection, TableMapping, Trigger};
use crate::schema::ObjectName;

/// Configures the main table of an entity type.
pub struct TableBuilder<'a> {
    entity: &'a mut EntityDecl,
}

impl<'a> TableBuilder<'a> {
    pub(super) fn new(entity: &'a mut EntityDecl) -> Self {
        Self { entity }
    }

    pub fn has_schema(&mut self, schema: &str) -> &mut Self {
        if let TableMapping::Table(name) = &mut self.entity.table {
            name.schema = Some(schema.to_string());
        }
        self
    }

    /// The table is mapped but never created, altered or dropped by
    /// migrations.
    pub fn exclude_from_migrations(&mut self) -> &mut Self {
        self.entity.excluded_from_migrations = true;
        self
    }

    pub fn has_comment(&mut self, comment: &str) -> &mut Self {
        self.entity.comment = Some(comment.to_string());
        self
    }
}

/// Configures a view or function mapping.
pub struct StoreObjectBuilder<'a> {
    name: &'a mut ObjectName,
    definition: &'a mut Option<String>,
}

impl<'a> StoreObjectBuilder<'a> {
    pub(super) fn new(name: &'a mut ObjectName, definition: &'a mut Option<String>) -> Self {
        Self { name, definition }
    }

    pub fn has_schema(&mut self, schema: &str) -> &mut Self {
        self.name.schema = Some(schema.to_string());
        self
    }

    /// SQL body. Objects with a definition are created and dropped by
    /// migrations.
    pub fn has_definition(&mut self, sql: &str) -> &mut Self {
        *self.definition = Some(sql.to_string());
        self
    }
}

/// Configures a split fragment: an extra table or view holding some of an
/// entity type's properties.
pub struct FragmentBuilder<'a> {
    fragment: &'a mut FragmentDecl,
}

impl<'a> FragmentBuilder<'a> {
    pub(super) fn new(fragment: &'a mut FragmentDecl) -> Self {
        Self { fragment }
    }

    pub fn has_schema(&mut self, schema: &str) -> &mut Self {
        self.fragment.name.schema = Some(schema.to_string());
        self
    }

    /// Moves `property` into this fragment.
    pub fn property(&mut self, property: &str) -> FragmentPropertyBuilder<'_> {
        if !self.fragment.properties.iter().any(|p| p == property) {
            self.fragment.properties.push(property.to_string());
        }
        FragmentPropertyBuilder {
            fragment: self.fragment,
            property: property.to_string(),
        }
    }

    pub fn exclude_from_migrations(&mut self) -> &mut Self {
        self.fragment.excluded_from_migrations = true;
        self
    }

    pub fn has_check_constraint(&mut self, name: &str, sql: &str) -> &mut Self {
        self.fragment.check_constraints.retain(|c| c.name != name);
        self.fragment.check_constraints.push(CheckConstraint {
            name: name.to_string(),
            sql: sql.to_string(),
        });
        self
    }

    pub fn has_trigger(&mut self, name: &str) -> &mut Self {
        if !self.fragment.triggers.iter().any(|t| t.name == name) {
            self.fragment.triggers.push(Trigger {
                name: name.to_string(),
            });
        }
        self
    }

    pub fn has_comment(&mut self, comment: &str) -> &mut Self {
        self.fragment.comment = Some(comment.to_string());
        self
    }
}

pub struct FragmentPropertyBuilder<'a> {
    fragment: &'a mut FragmentDecl,
    property: String,
}

impl FragmentPropertyBuilder<'_> {
    /// Column name of the property in this fragment only.
    pub fn has_column_name(&mut self, name: &str) -> &mut Self {
        let column_names = &mut self.fragment.column_names;
        column_names.retain(|(property, _)| *property != self.property);
        column_names.push((self.property.clone(), name.to_string()));
        self
    }
}

/// Configures an insert, update or delete stored procedure.
pub struct ProcedureBuilder<'a> {
    procedure: &'a mut ProcedureDecl,
}

impl<'a> ProcedureBuilder<'a> {
    pub(super) fn new(procedure: &'a mut ProcedureDecl) -> Self {
        Self { procedure }
    }

    pub fn has_schema(&mut self, schema: &str) -> &mut Self {
        self.procedure.name.schema = Some(schema.to_string());
        self
    }

    /// Binds `property` to the next parameter.
    pub fn has_parameter(&mut self, property: &str) -> ParameterBuilder<'_> {
        let parameters = &mut self.procedure.parameters;
        parameters.push(ParameterDecl {
            property: property.to_string(),
            name: None,
            direction: ParameterDirection::Input,
            original_value: false,
        });
        let index = parameters.len() - 1;
        ParameterBuilder {
            parameter: &mut parameters[index],
        }
    }

    /// Reads `property` back from the procedure's result set.
    pub fn has_result_column(&mut self, property: &str) -> &mut Self {
        self.procedure.result_columns.push(property.to_string());
        self
    }

    pub fn has_definition(&mut self, sql: &str) -> &mut Self {
        self.procedure.definition = Some(sql.to_string());
        self
    }
}

pub struct ParameterBuilder<'a> {
    parameter: &'a mut ParameterDecl,
}

impl ParameterBuilder<'_> {
    pub fn has_name(&mut self, name: &str) -> &mut Self {
        self.parameter.name = Some(name.to_string());
        self
    }

    pub fn is_output(&mut self) -> &mut Self {
        self.parameter.direction = ParameterDirection::Output;
        self
    }

    pub fn is_input_output(&mut self) -> &mut Self {
        self.parameter.direction = ParameterDirection::InputOutput;
        self
    }

    /// Binds the value the property had when the entity was loaded.
    pub fn is_original_value(&mut self) -> &mut Self {
        self.parameter.original_value = true;
        self
    }
}

/// Configures JSON storage of an owned type.
pub struct JsonBuilder<'a> {
    ownership: Option<&'a mut OwnershipDecl>,
}

impl<'a> JsonBuilder<'a> {
    pub(super) fn new(ownership: Option<&'a mut OwnershipDecl>) -> Self {
        Self { ownership }
    }

    /// Name of the container column; the navigation name by default.
    pub fn has_column_name(&mut self, name: &str) -> &mut Self {
        if let Some(ownership) = &mut self.ownership {
            ownership.json_column = Some(name.to_string());
        }
        self
    }
}
