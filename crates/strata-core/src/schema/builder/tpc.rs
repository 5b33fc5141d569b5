//! Table per concrete type: each concrete type gets an independent table
//! with every member of its ancestry. Abstract types are not stored.

use super::columns::Placement;
use super::BuildSchema;
use crate::schema::app::{self, ComplexProperty, EntityType, Property};
use crate::schema::ObjectName;

pub(super) fn table_name(cx: &BuildSchema<'_>, entity: &EntityType) -> Option<ObjectName> {
    if entity.is_abstract {
        return None;
    }
    cx.default_table_name(entity)
}

pub(super) fn placement(store: ObjectName, depth: usize) -> Placement {
    Placement::new(store, depth)
}

pub(super) fn members<'a>(
    app: &'a app::Model,
    entity: &'a EntityType,
) -> (Vec<&'a Property>, Vec<&'a ComplexProperty>) {
    let ancestry = app.ancestry(entity.id);
    (
        ancestry.iter().flat_map(|e| &e.properties).collect(),
        ancestry.iter().flat_map(|e| &e.complex_properties).collect(),
    )
}

/// The root key property a shared sequence can feed: a single integer,
/// generated on add, with no default of its own.
pub(super) fn sequence_key<'a>(app: &'a app::Model, root: &'a EntityType) -> Option<&'a Property> {
    let key = root.primary_key.as_ref()?;
    let [id] = key.properties.as_slice() else {
        return None;
    };

    let property = app.property(*id);
    let eligible = property.ty.is_integer()
        && property.value_generated.on_add()
        && property.default.is_none()
        && property.computed.is_none()
        && property.sequence.is_none();

    eligible.then_some(property)
}
