//! Table per hierarchy: every type of a hierarchy is stored in the root's
//! table, told apart by the discriminator column.

use super::columns::Placement;
use super::BuildSchema;
use crate::schema::app::{ComplexProperty, EntityType, Property, TableMapping};
use crate::schema::ObjectName;
use crate::{Error, Result};

pub(super) fn table_name(cx: &BuildSchema<'_>, entity: &EntityType) -> Result<Option<ObjectName>> {
    let root = cx.app.root_of(entity.id);
    let root_table = cx.default_table_name(root);

    if root.id == entity.id {
        return Ok(root_table);
    }

    match &entity.table {
        TableMapping::Default => Ok(root_table),
        TableMapping::Table(name) if Some(cx.qualify(name)) == root_table => Ok(root_table),
        TableMapping::Table(name) => Err(Error::invalid_schema(format!(
            "`{}` maps to table `{name}`, but TPH types are stored in the table of their root `{}`",
            entity.name, root.name
        ))),
        TableMapping::None => Err(Error::invalid_schema(format!(
            "`{}` cannot be unmapped on its own; TPH types are stored in the table of their root `{}`",
            entity.name, root.name
        ))),
    }
}

/// Rows of sibling types leave the columns of derived types empty.
pub(super) fn placement(entity: &EntityType, store: ObjectName, depth: usize) -> Placement {
    Placement {
        optional: entity.base.is_some(),
        ..Placement::new(store, depth)
    }
}

/// Each type contributes the members it declares.
pub(super) fn members(entity: &EntityType) -> (Vec<&Property>, Vec<&ComplexProperty>) {
    (
        entity.properties.iter().collect(),
        entity.complex_properties.iter().collect(),
    )
}
