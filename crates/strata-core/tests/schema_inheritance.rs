use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{MappingStrategy, ModelBuilder, Type, ValueGenerated};
use strata_core::schema::db;
use strata_core::schema::{DefaultValue, Schema};

fn project(f: impl FnOnce(&mut ModelBuilder)) -> Schema {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model))
}

fn animals(builder: &mut ModelBuilder, strategy: MappingStrategy) {
    builder
        .entity("Animal", |e| {
            e.use_mapping_strategy(strategy);
            e.property("Id", Type::I32);
            e.property("Name", Type::String);
            e.has_key(&["Id"]);
        })
        .entity("Cat", |e| {
            e.has_base_type("Animal");
            e.property("Lives", Type::I32);
        })
        .entity("Dog", |e| {
            e.has_base_type("Animal");
            e.property("Breed", Type::String);
        });
}

fn column_names(table: &db::Table) -> Vec<&str> {
    table.columns.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn tph_stores_hierarchy_in_root_table() {
    let schema = project(|b| animals(b, MappingStrategy::Tph));

    assert_eq!(schema.db.tables.len(), 1);
    let table = schema.db.find_table("Animal").unwrap();
    assert_eq!(
        column_names(table),
        ["Id", "Discriminator", "Name", "Breed", "Lives"]
    );
    assert_eq!(table.entity_types, ["Animal", "Cat", "Dog"]);

    // Longest value is `Animal`
    let discriminator = table.find_column("Discriminator").unwrap();
    assert_eq!(discriminator.ty, db::Type::VarChar(6));
    assert!(!discriminator.nullable);

    // Siblings leave each other's columns empty
    assert!(table.find_column("Lives").unwrap().nullable);
    assert!(table.find_column("Breed").unwrap().nullable);

    let pk = table.primary_key.as_ref().unwrap();
    assert_eq!(pk.name, "PK_Animal");
    assert_eq!(table.column_names(&pk.columns), ["Id"]);
    assert_empty!(table.foreign_keys);
}

#[test]
fn tph_discriminator_values_default_to_type_names() {
    let schema = project(|b| animals(b, MappingStrategy::Tph));

    let values: Vec<_> = schema
        .app
        .entity_types()
        .map(|e| e.discriminator_value.as_ref().map(|v| v.to_string()))
        .collect();
    assert_eq!(
        values,
        [
            Some("Animal".to_string()),
            Some("Cat".to_string()),
            Some("Dog".to_string())
        ]
    );
}

#[test]
fn tph_custom_discriminator() {
    let schema = project(|b| {
        animals(b, MappingStrategy::Tph);
        b.entity("Animal", |e| {
            e.is_abstract();
            e.property("Kind", Type::String).is_required().has_max_length(20);
            e.has_discriminator("Kind");
        })
        .entity("Cat", |e| {
            e.has_discriminator_value("c");
        });
    });

    let table = schema.db.find_table("Animal").unwrap();
    assert_none!(table.find_column("Discriminator"));
    assert_eq!(table.find_column("Kind").unwrap().ty, db::Type::VarChar(20));

    let animal = schema.app.find_entity_type("Animal").unwrap();
    assert_none!(animal.discriminator_value);
    let cat = schema.app.find_entity_type("Cat").unwrap();
    assert_eq!(cat.discriminator_value.as_ref().unwrap().to_string(), "c");
}

#[test]
fn tph_shared_column_across_siblings() {
    let schema = project(|b| {
        animals(b, MappingStrategy::Tph);
        b.entity("Cat", |e| {
            e.property("Owner", Type::String).has_max_length(40);
        })
        .entity("Dog", |e| {
            e.property("Owner", Type::String).has_max_length(40);
        });
    });

    let table = schema.db.find_table("Animal").unwrap();
    let owner = table.find_column("Owner").unwrap();
    assert_eq!(owner.mappings.len(), 2);
    assert_unique!(column_names(table));
}

#[test]
fn tph_derived_type_in_other_table_is_rejected() {
    let mut builder = ModelBuilder::new();
    animals(&mut builder, MappingStrategy::Tph);
    builder.entity("Cat", |e| {
        e.to_table("Cats");
    });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert!(err.is_invalid_schema());
    assert_message!(err, "`Cat` maps to table `Cats`");
}

#[test]
fn tpt_derived_tables_reference_base_table() {
    let schema = project(|b| animals(b, MappingStrategy::Tpt));

    let names: Vec<_> = schema.db.tables.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, ["Animal", "Cat", "Dog"]);

    let animal = schema.db.find_table("Animal").unwrap();
    assert_eq!(column_names(animal), ["Id", "Name"]);
    assert_none!(animal.find_column("Discriminator"));

    let cat = schema.db.find_table("Cat").unwrap();
    assert_eq!(column_names(cat), ["Id", "Lives"]);
    assert!(!cat.find_column("Lives").unwrap().nullable);
    assert_eq!(cat.primary_key.as_ref().unwrap().name, "PK_Cat");

    let [fk] = &cat.foreign_keys[..] else {
        panic!("expected one foreign key; actual={:?}", cat.foreign_keys);
    };
    assert_eq!(fk.name, "FK_Cat_Animal_Id");
    assert_eq!(fk.principal, animal.id);
    assert_eq!(fk.on_delete, strata_core::schema::app::ReferentialAction::Cascade);
}

#[test]
fn tpt_derived_key_is_not_generated() {
    let schema = project(|b| {
        animals(b, MappingStrategy::Tpt);
        b.entity("Animal", |e| {
            e.property("Id", Type::I32).value_generated_on_add();
        });
    });

    let animal = schema.db.find_table("Animal").unwrap();
    assert_eq!(animal.find_column("Id").unwrap().value_generated, ValueGenerated::OnAdd);

    let dog = schema.db.find_table("Dog").unwrap();
    assert_eq!(dog.find_column("Id").unwrap().value_generated, ValueGenerated::Never);
}

#[test]
fn tpc_concrete_tables_share_a_key_sequence() {
    let schema = project(|b| {
        animals(b, MappingStrategy::Tpc);
        b.entity("Animal", |e| {
            e.is_abstract();
            e.property("Id", Type::I32).value_generated_on_add();
        });
    });

    let names: Vec<_> = schema.db.tables.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, ["Cat", "Dog"]);

    let sequence = schema.db.find_sequence("AnimalSequence").unwrap();
    assert_eq!(sequence.ty, db::Type::Integer(4));
    assert_eq!(sequence.start, 1);

    for table in &schema.db.tables {
        let id = table.find_column("Id").unwrap();
        assert_eq!(
            id.default,
            Some(DefaultValue::Sql("NEXT VALUE FOR [AnimalSequence]".to_string()))
        );
        assert!(table.find_column("Name").is_some());
        assert_empty!(table.foreign_keys);
    }

    assert_eq!(column_names(schema.db.find_table("Cat").unwrap()), ["Id", "Name", "Lives"]);
}

#[test]
fn tpc_without_generated_key_has_no_sequence() {
    let schema = project(|b| animals(b, MappingStrategy::Tpc));

    assert_empty!(schema.db.sequences);
    // The root is concrete, so it gets a table of its own
    assert_eq!(schema.db.tables.len(), 3);
    assert_none!(schema.db.find_table("Cat").unwrap().find_column("Id").unwrap().default);
}

#[test]
fn tpc_sequences_can_be_disabled() {
    let mut builder = ModelBuilder::new();
    animals(&mut builder, MappingStrategy::Tpc);
    builder.entity("Animal", |e| {
        e.property("Id", Type::I32).value_generated_on_add();
    });
    let model = assert_ok!(builder.finalize());

    let schema = assert_ok!(strata_core::schema::Builder::new()
        .tpc_sequences(false)
        .build(model));
    assert_empty!(schema.db.sequences);
}

#[test]
fn derived_type_cannot_declare_a_key() {
    let mut builder = ModelBuilder::new();
    animals(&mut builder, MappingStrategy::Tph);
    builder.entity("Cat", |e| {
        e.has_key(&["Lives"]);
    });

    let err = assert_err!(builder.finalize());
    assert!(err.is_invalid_schema());
    assert_message!(err, "keys are declared on the hierarchy root");
}

#[test]
fn mismatched_strategy_in_hierarchy_is_rejected() {
    let mut builder = ModelBuilder::new();
    animals(&mut builder, MappingStrategy::Tph);
    builder.entity("Dog", |e| {
        e.use_mapping_strategy(MappingStrategy::Tpt);
    });

    let err = assert_err!(builder.finalize());
    assert_message!(err, "declares mapping strategy Tpt");
}
