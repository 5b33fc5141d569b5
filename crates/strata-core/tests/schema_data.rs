use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{MappingStrategy, ModelBuilder, Type};
use strata_core::schema::db;
use strata_core::schema::{Schema, Value};

fn project(f: impl FnOnce(&mut ModelBuilder)) -> Schema {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model))
}

fn project_err(f: impl FnOnce(&mut ModelBuilder)) -> strata_core::Error {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    match builder.finalize() {
        Ok(model) => assert_err!(Schema::project(model)),
        Err(err) => err,
    }
}

fn animals(builder: &mut ModelBuilder, strategy: MappingStrategy) {
    builder
        .entity("Animal", |e| {
            e.use_mapping_strategy(strategy);
            e.property("Id", Type::I32);
            e.property("Name", Type::String);
            e.has_key(&["Id"]);
            e.has_data().value("Id", 1).value("Name", "Rex");
        })
        .entity("Cat", |e| {
            e.has_base_type("Animal");
            e.property("Lives", Type::I32);
            e.has_data()
                .value("Id", 2)
                .value("Name", "Tom")
                .value("Lives", 9);
        });
}

/// Rows as column name and value pairs.
fn rows(table: &db::Table) -> Vec<Vec<(&str, Value)>> {
    table
        .data
        .iter()
        .map(|row| {
            row.values
                .iter()
                .map(|(column, value)| (table.column(*column).name.as_str(), value.clone()))
                .collect()
        })
        .collect()
}

#[test]
fn tph_rows_carry_their_discriminator() {
    let schema = project(|b| animals(b, MappingStrategy::Tph));

    let table = schema.db.find_table("Animal").unwrap();
    assert_eq!(
        rows(table),
        [
            vec![
                ("Id", Value::from(1)),
                ("Discriminator", Value::from("Animal")),
                ("Name", Value::from("Rex")),
            ],
            vec![
                ("Id", Value::from(2)),
                ("Discriminator", Value::from("Cat")),
                ("Name", Value::from("Tom")),
                ("Lives", Value::from(9)),
            ],
        ]
    );
}

#[test]
fn tpt_rows_are_split_across_tables() {
    let schema = project(|b| animals(b, MappingStrategy::Tpt));

    let animal = schema.db.find_table("Animal").unwrap();
    assert_eq!(
        rows(animal),
        [
            vec![("Id", Value::from(1)), ("Name", Value::from("Rex"))],
            vec![("Id", Value::from(2)), ("Name", Value::from("Tom"))],
        ]
    );

    let cat = schema.db.find_table("Cat").unwrap();
    assert_eq!(
        rows(cat),
        [vec![("Id", Value::from(2)), ("Lives", Value::from(9))]]
    );
}

#[test]
fn tpc_rows_stay_in_their_own_table() {
    let schema = project(|b| animals(b, MappingStrategy::Tpc));

    let animal = schema.db.find_table("Animal").unwrap();
    assert_eq!(rows(animal).len(), 1);

    let cat = schema.db.find_table("Cat").unwrap();
    assert_eq!(
        rows(cat),
        [vec![
            ("Id", Value::from(2)),
            ("Name", Value::from("Tom")),
            ("Lives", Value::from(9)),
        ]]
    );
}

#[test]
fn owned_reference_rows_merge_into_owner_row() {
    let schema = project(|b| {
        b.entity("Order", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_data().value("Id", 1);
            e.owns_one("ShippingAddress", |a| {
                a.property("Street", Type::String);
                a.has_data().value("OrderId", 1).value("Street", "Main St");
            });
        });
    });

    let order = schema.db.find_table("Order").unwrap();
    assert_eq!(
        rows(order),
        [vec![
            ("Id", Value::from(1)),
            ("ShippingAddress_Street", Value::from("Main St")),
        ]]
    );
}

#[test]
fn seed_rows_must_set_the_key() {
    let err = project_err(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.property("Url", Type::String);
            e.has_key(&["Id"]);
            e.has_data().value("Url", "a.example");
        });
    });
    assert!(err.is_invalid_schema());
    assert_message!(err, "does not set every key property");

    let err = project_err(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_data().value("Id", Value::Null);
        });
    });
    assert_message!(err, "does not set every key property");
}

#[test]
fn seed_keys_are_unique() {
    let err = project_err(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.property("Url", Type::String);
            e.has_key(&["Id"]);
            e.has_data().value("Id", 1).value("Url", "a.example");
            e.has_data().value("Id", 1).value("Url", "b.example");
        });
    });
    assert!(err.is_invalid_schema());
    assert_message!(err, "two seed rows of `Blog` have the key 1");
}

#[test]
fn seed_values_name_declared_properties() {
    let err = project_err(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_data().value("Id", 1).value("Rating", 5);
        });
    });
    assert!(err.is_invalid_schema());
    assert_message!(err, "`Rating` is not declared on `Blog`");
}

#[test]
fn abstract_and_keyless_types_cannot_be_seeded() {
    let err = project_err(|b| {
        b.entity("Animal", |e| {
            e.is_abstract();
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_data().value("Id", 1);
        });
    });
    assert_message!(err, "`Animal` is abstract");

    let err = project_err(|b| {
        b.entity("Reading", |e| {
            e.property("Value", Type::F64);
            e.has_no_key();
            e.has_data().value("Value", 1.5);
        });
    });
    assert_message!(err, "`Reading` has seed data but no key");
}

#[test]
fn later_values_replace_earlier_ones() {
    let schema = project(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.property("Url", Type::String);
            e.has_key(&["Id"]);
            e.has_data()
                .value("Id", 1)
                .value("Url", "a.example")
                .value("Url", "b.example");
        });
    });

    let blog = schema.db.find_table("Blog").unwrap();
    assert_eq!(
        rows(blog),
        [vec![("Id", Value::from(1)), ("Url", Value::from("b.example"))]]
    );
}
