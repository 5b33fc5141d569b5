use super::columns::{Contribution, Placement};
use super::BuildSchema;
use crate::schema::app::{EntityType, StoreObjectKind, StoredProcedureMapping};
use crate::schema::db::{
    self, ColumnMapping, FunctionId, Parameter, ProcedureId, StoreObjectId, ViewId,
};
use crate::schema::ObjectName;
use crate::{Error, Result};

use tracing::debug;

impl BuildSchema<'_> {
    /// Views, table-valued functions and stored procedures. Views and
    /// functions may be shared by several entity types; their columns are
    /// aggregated like table columns.
    pub(super) fn build_routines(&mut self) -> Result<()> {
        let app = self.app;
        let mut view_columns: Vec<Vec<Contribution>> = vec![];
        let mut function_columns: Vec<Vec<Contribution>> = vec![];

        for id in app.canonical_order() {
            let entity = app.entity_type(id);

            if let Some(view) = &entity.view {
                let view_id = self.view_stub(&view.name, view.definition.as_deref(), entity)?;
                if view_columns.len() <= view_id.0 {
                    view_columns.push(vec![]);
                }
                let placement = Placement::new(view.name.clone(), 0);
                let contributions = self.result_contributions(entity, &placement, true)?;
                view_columns[view_id.0].extend(contributions);
            }

            for fragment in &entity.fragments {
                if fragment.kind != StoreObjectKind::View {
                    continue;
                }
                let view_id = self.view_stub(&fragment.name, None, entity)?;
                if view_columns.len() <= view_id.0 {
                    view_columns.push(vec![]);
                }
                let placement = Placement::new(fragment.name.clone(), 0);
                let key = app
                    .primary_key_of(id)
                    .map(|key| key.properties.as_slice())
                    .unwrap_or_default();
                for (position, property) in key.iter().enumerate() {
                    let property = app.property(*property);
                    let contribution = self.contribution(entity, &placement, property, property.name.clone(), Some(position))?;
                    view_columns[view_id.0].push(contribution.into_result_column());
                }
                for property in &fragment.properties {
                    let property = app.property(*property);
                    let contribution = self.contribution(entity, &placement, property, property.name.clone(), None)?;
                    view_columns[view_id.0].push(contribution.into_result_column());
                }
            }

            if let Some(function) = &entity.function {
                let function_id = self.function_stub(&function.name, function.definition.as_deref(), entity)?;
                if function_columns.len() <= function_id.0 {
                    function_columns.push(vec![]);
                }
                let placement = Placement::new(function.name.clone(), 0);
                let contributions = self.result_contributions(entity, &placement, false)?;
                function_columns[function_id.0].extend(contributions);
            }

            for procedure in &entity.procedures {
                self.build_procedure(entity, procedure)?;
            }
        }

        for (index, contributions) in view_columns.into_iter().enumerate() {
            let name = self.views[index].name.clone();
            self.views[index].columns = self.aggregate(ViewId(index).into(), &name, contributions)?;
        }
        for (index, contributions) in function_columns.into_iter().enumerate() {
            let name = self.functions[index].name.clone();
            self.functions[index].columns =
                self.aggregate(FunctionId(index).into(), &name, contributions)?;
        }

        Ok(())
    }

    fn view_stub(&mut self, name: &ObjectName, definition: Option<&str>, entity: &EntityType) -> Result<ViewId> {
        let name = self.qualify(name);

        let id = match self.views.iter().position(|v| v.name == name) {
            Some(index) => {
                let view = &mut self.views[index];
                merge_definition(&mut view.definition, definition, &name)?;
                ViewId(index)
            }
            None => {
                debug!(view = %name, entity = %entity.name, "creating view");
                let id = ViewId(self.views.len());
                self.views.push(db::View {
                    id,
                    name,
                    columns: vec![],
                    definition: definition.map(String::from),
                    entity_types: vec![],
                });
                id
            }
        };

        let view = &mut self.views[id.0];
        if !view.entity_types.contains(&entity.name) {
            view.entity_types.push(entity.name.clone());
        }
        self.mapping.entity_type_mut(entity.id).fragment_mut(id.into());
        Ok(id)
    }

    fn function_stub(
        &mut self,
        name: &ObjectName,
        definition: Option<&str>,
        entity: &EntityType,
    ) -> Result<FunctionId> {
        let name = self.qualify(name);

        let id = match self.functions.iter().position(|f| f.name == name) {
            Some(index) => {
                let function = &mut self.functions[index];
                merge_definition(&mut function.definition, definition, &name)?;
                FunctionId(index)
            }
            None => {
                debug!(function = %name, entity = %entity.name, "creating function");
                let id = FunctionId(self.functions.len());
                self.functions.push(db::Function {
                    id,
                    name,
                    columns: vec![],
                    definition: definition.map(String::from),
                    entity_types: vec![],
                });
                id
            }
        };

        let function = &mut self.functions[id.0];
        if !function.entity_types.contains(&entity.name) {
            function.entity_types.push(entity.name.clone());
        }
        self.mapping.entity_type_mut(entity.id).fragment_mut(id.into());
        Ok(id)
    }

    /// Columns a view or function returns for `entity`: every visible
    /// property and complex member. With `exclude_split`, properties split
    /// to another view are left out.
    fn result_contributions(
        &self,
        entity: &EntityType,
        placement: &Placement,
        exclude_split: bool,
    ) -> Result<Vec<Contribution>> {
        let app = self.app;
        let key = app
            .primary_key_of(entity.id)
            .map(|key| key.properties.as_slice())
            .unwrap_or_default();
        let split: Vec<_> = entity
            .fragments
            .iter()
            .filter(|f| exclude_split && f.kind == StoreObjectKind::View)
            .flat_map(|f| f.properties.iter().copied())
            .collect();

        let mut contributions = vec![];
        for property in app.properties_of(entity.id) {
            if split.contains(&property.id) {
                continue;
            }
            let key_position = key.iter().position(|k| *k == property.id);
            let contribution = self.contribution(entity, placement, property, property.name.clone(), key_position)?;
            contributions.push(contribution.into_result_column());
        }

        for owner in app.ancestry(entity.id) {
            for complex in &owner.complex_properties {
                let nested = Placement {
                    prefix: format!("{}_", complex.name),
                    optional: !complex.required,
                    ..placement.clone()
                };
                for property in &complex.properties {
                    let path = format!("{}.{}", complex.name, property.name);
                    let contribution = self.contribution(entity, &nested, property, path, None)?;
                    contributions.push(contribution.into_result_column());
                }
            }
        }

        Ok(contributions)
    }

    fn build_procedure(&mut self, entity: &EntityType, mapping: &StoredProcedureMapping) -> Result<()> {
        let app = self.app;
        let name = self.qualify(&mapping.name);

        if self.procedures.iter().any(|p| p.name == name) {
            return Err(Error::invalid_schema(format!(
                "stored procedure `{name}` is mapped more than once (by `{}`)",
                entity.name
            )));
        }

        let main = self.targets.get(&entity.id).copied().flatten();
        let mut parameters = Vec::with_capacity(mapping.parameters.len());
        for parameter in &mapping.parameters {
            let property = app.property(parameter.property);

            // Parameters default to the name of the column the property is
            // stored in
            let column = main
                .and_then(|table| {
                    let column = app.ancestry(entity.id).into_iter().rev().find_map(|e| {
                        self.mapping
                            .entity_type(e.id)
                            .column(table.into(), parameter.property)
                    })?;
                    Some(self.tables[table.0].columns[column.index].name.clone())
                })
                .unwrap_or_else(|| {
                    property
                        .column_name
                        .clone()
                        .unwrap_or_else(|| property.name.clone())
                });

            let name = match &parameter.name {
                Some(name) => name.clone(),
                None if parameter.original_value => format!("{column}_Original"),
                None => column,
            };

            parameters.push(Parameter {
                name,
                ty: self.store_type(entity, &property.name, property)?,
                direction: parameter.direction,
                original_value: parameter.original_value,
                mapping: ColumnMapping {
                    entity: entity.name.clone(),
                    property: property.name.clone(),
                },
            });
        }

        let id = ProcedureId(self.procedures.len());
        let placement = Placement::new(mapping.name.clone(), 0);
        let mut contributions = Vec::with_capacity(mapping.result_columns.len());
        for property in &mapping.result_columns {
            let property = app.property(*property);
            let contribution = self.contribution(entity, &placement, property, property.name.clone(), None)?;
            contributions.push(contribution.into_result_column());
        }

        debug!(procedure = %name, kind = ?mapping.kind, entity = %entity.name, "creating stored procedure");
        self.mapping
            .entity_type_mut(entity.id)
            .fragment_mut(StoreObjectId::StoredProcedure(id));
        let result_columns = self.aggregate(id.into(), &name, contributions)?;

        self.procedures.push(db::StoredProcedure {
            id,
            name,
            kind: mapping.kind,
            parameters,
            result_columns,
            definition: mapping.definition.clone(),
            entity_types: vec![entity.name.clone()],
        });
        Ok(())
    }
}

/// Several entity types may map one routine; at most one definition may be
/// given for it.
fn merge_definition(existing: &mut Option<String>, definition: Option<&str>, name: &ObjectName) -> Result<()> {
    match (existing.as_deref(), definition) {
        (Some(a), Some(b)) if a != b => Err(Error::invalid_schema(format!(
            "`{name}` is mapped with two different definitions"
        ))),
        (None, Some(definition)) => {
            *existing = Some(definition.to_string());
            Ok(())
        }
        _ => Ok(()),
    }
}
