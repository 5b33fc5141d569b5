use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{ModelBuilder, ReferentialAction, Type, ValueGenerated};
use strata_core::schema::db;
use strata_core::schema::Schema;

fn project(f: impl FnOnce(&mut ModelBuilder)) -> Schema {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model))
}

fn orders(builder: &mut ModelBuilder) {
    builder.entity("Order", |e| {
        e.property("Id", Type::I32);
        e.has_key(&["Id"]);
        e.owns_one("ShippingAddress", |a| {
            a.property("Street", Type::String);
            a.property("City", Type::String);
        });
        e.owns_many("Lines", |l| {
            l.property("Product", Type::String);
            l.property("Quantity", Type::I32);
        });
    });
}

fn column_names(table: &db::Table) -> Vec<&str> {
    table.columns.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn owned_reference_is_inlined_into_owner_table() {
    let schema = project(orders);

    let order = schema.db.find_table("Order").unwrap();
    assert_eq!(
        column_names(order),
        ["Id", "ShippingAddress_City", "ShippingAddress_Street"]
    );
    assert_eq!(order.entity_types, ["Order", "Order.ShippingAddress"]);

    // The owned key shares the owner's key column
    let id = order.find_column("Id").unwrap();
    assert_eq!(id.mappings.len(), 2);
    assert!(!id.nullable);

    // An optional dependent leaves its columns empty
    assert!(order.find_column("ShippingAddress_City").unwrap().nullable);

    // Rows are shared, so no constraint links them
    assert_empty!(order.foreign_keys);
}

#[test]
fn required_owned_reference_keeps_nullability() {
    let schema = project(|b| {
        orders(b);
        b.entity("Order.ShippingAddress", |a| {
            a.is_required();
            a.property("Street", Type::String).is_required();
        });
    });

    let order = schema.db.find_table("Order").unwrap();
    assert!(!order.find_column("ShippingAddress_Street").unwrap().nullable);
    assert!(order.find_column("ShippingAddress_City").unwrap().nullable);
}

#[test]
fn owned_collection_gets_its_own_table() {
    let schema = project(orders);

    let lines = schema.db.find_table("OrderLines").unwrap();
    assert_eq!(column_names(lines), ["OrderId", "Id", "Product", "Quantity"]);

    let pk = lines.primary_key.as_ref().unwrap();
    assert_eq!(pk.name, "PK_OrderLines");
    assert_eq!(lines.column_names(&pk.columns), ["OrderId", "Id"]);
    assert_eq!(lines.find_column("Id").unwrap().value_generated, ValueGenerated::OnAdd);

    let [fk] = &lines.foreign_keys[..] else {
        panic!("expected one foreign key; actual={:?}", lines.foreign_keys);
    };
    assert_eq!(fk.name, "FK_OrderLines_Order_OrderId");
    assert_eq!(fk.on_delete, ReferentialAction::Cascade);
    assert_eq!(schema.db.table(fk.principal).name, "Order");

    // The key already covers the foreign key
    assert_empty!(lines.indices);
}

#[test]
fn owned_collection_can_be_renamed() {
    let schema = project(|b| {
        orders(b);
        b.entity("Order.Lines", |l| {
            l.to_table("OrderLine").has_schema("sales");
        });
    });

    let lines = schema.db.tables.iter().find(|t| t.name.name == "OrderLine").unwrap();
    assert_eq!(lines.name.schema.as_deref(), Some("sales"));
    assert!(schema.db.schemas().contains("sales"));
}

#[test]
fn json_owned_graph_uses_one_column() {
    let schema = project(|b| {
        orders(b);
        b.entity("Order", |e| {
            e.owns_one("Details", |d| {
                d.to_json();
                d.property("Notes", Type::String);
                d.owns_many("Tags", |t| {
                    t.property("Label", Type::String);
                });
            });
        });
    });

    let order = schema.db.find_table("Order").unwrap();
    let details = order.find_column("Details").unwrap();
    assert_eq!(details.ty, db::Type::Json);
    assert!(details.nullable);
    assert_eq!(details.mappings[0].entity, "Order");
    assert_eq!(details.mappings[0].property, "Details");

    // Nothing inside the document gets a table or column
    assert_none!(order.find_column("Details_Notes"));
    assert_none!(schema.db.find_table("DetailsTags"));
    assert_eq!(schema.db.tables.len(), 2);
}

#[test]
fn json_column_name_can_be_set() {
    let schema = project(|b| {
        orders(b);
        b.entity("Order", |e| {
            e.owns_one("Details", |d| {
                d.to_json().has_column_name("DetailsJson");
                d.property("Notes", Type::String);
            });
        });
    });

    let order = schema.db.find_table("Order").unwrap();
    assert!(order.find_column("DetailsJson").is_some());
    assert_none!(order.find_column("Details"));
}

#[test]
fn complex_property_is_flattened() {
    let schema = project(|b| {
        b.entity("Customer", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.complex_property("Address", |c| {
                c.is_required();
                c.property("Street", Type::String).is_required();
                c.complex_property("Geo", |g| {
                    g.property("Lat", Type::F64);
                });
            });
        });
    });

    let customer = schema.db.find_table("Customer").unwrap();
    assert_eq!(
        column_names(customer),
        ["Id", "Address_Geo_Lat", "Address_Street"]
    );
    assert!(!customer.find_column("Address_Street").unwrap().nullable);
    // Optional nested complex property
    assert!(customer.find_column("Address_Geo_Lat").unwrap().nullable);

    let lat = customer.find_column("Address_Geo_Lat").unwrap();
    assert_eq!(lat.mappings[0].property, "Address.Geo.Lat");
}

#[test]
fn owning_again_through_same_navigation_reconfigures() {
    let mut builder = ModelBuilder::new();
    orders(&mut builder);
    builder.entity("Order", |e| {
        e.owns_one("ShippingAddress", |_| {});
    });
    let model = assert_ok!(builder.finalize());
    let address = model.find_entity_type("Order.ShippingAddress").unwrap();
    assert!(!address.ownership.as_ref().unwrap().collection);
    assert_eq!(address.properties.len(), 3);
}

#[test]
fn to_json_requires_an_owned_type() {
    let mut builder = ModelBuilder::new();
    builder.entity("Order", |e| {
        e.property("Id", Type::I32);
        e.has_key(&["Id"]);
        e.to_json();
    });

    let err = assert_err!(builder.finalize());
    assert!(err.is_invalid_schema());
    assert_message!(err, "`to_json` applies to owned types");
}

#[test]
fn owned_collection_key_copies_owner_key_facets() {
    let schema = project(|b| {
        b.entity("Order", |e| {
            e.property("Code", Type::String).has_max_length(10);
            e.has_key(&["Code"]);
            e.owns_many("Addresses", |a| {
                a.to_table("OrderAddresses");
                a.property("Street", Type::String);
            });
        });
    });

    let order = schema.db.find_table("Order").unwrap();
    let addresses = schema.db.find_table("OrderAddresses").unwrap();
    assert_eq!(
        addresses.find_column("OrderCode").unwrap().ty,
        order.find_column("Code").unwrap().ty
    );
    assert_eq!(addresses.foreign_keys.len(), 1);
}
