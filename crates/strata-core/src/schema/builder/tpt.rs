//! Table per type: every type gets its own table holding the members it
//! declares. Derived tables repeat the key and reference their base table.

use super::columns::Placement;
use super::BuildSchema;
use crate::schema::app::{self, ComplexProperty, EntityType, Property};
use crate::schema::ObjectName;

pub(super) fn table_name(cx: &BuildSchema<'_>, entity: &EntityType) -> Option<ObjectName> {
    cx.default_table_name(entity)
}

/// The key repeated in a derived table takes its values from the base row.
pub(super) fn placement(entity: &EntityType, store: ObjectName, depth: usize) -> Placement {
    Placement {
        dependent_key: entity.base.is_some(),
        ..Placement::new(store, depth)
    }
}

pub(super) fn members<'a>(
    app: &'a app::Model,
    entity: &'a EntityType,
) -> (Vec<&'a Property>, Vec<&'a ComplexProperty>) {
    let mut properties = vec![];

    if entity.base.is_some() {
        if let Some(key) = app.primary_key_of(entity.id) {
            properties.extend(key.properties.iter().map(|id| app.property(*id)));
        }
    }
    properties.extend(&entity.properties);

    (properties, entity.complex_properties.iter().collect())
}
