use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{ModelBuilder, ParameterDirection, ProcedureKind, ReferentialAction, Type};
use strata_core::schema::db::{self, StoreObjectId};
use strata_core::schema::{DefaultValue, Schema};

fn project(f: impl FnOnce(&mut ModelBuilder)) -> Schema {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model))
}

fn customers(builder: &mut ModelBuilder) {
    builder.entity("Customer", |e| {
        e.property("Id", Type::I32).value_generated_on_add();
        e.property("Name", Type::String);
        e.property("Bio", Type::String);
        e.property("Photo", Type::Bytes);
        e.has_key(&["Id"]);
    });
}

fn column_names(columns: &[db::Column]) -> Vec<&str> {
    columns.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn split_table_repeats_key_and_references_main_table() {
    let schema = project(|b| {
        customers(b);
        b.entity("Customer", |e| {
            e.split_to_table("CustomerDetails", |f| {
                f.property("Bio");
                f.property("Photo").has_column_name("Picture");
                f.exclude_from_migrations();
            });
        });
    });

    let customer = schema.db.find_table("Customer").unwrap();
    assert_eq!(column_names(&customer.columns), ["Id", "Name"]);

    let details = schema.db.find_table("CustomerDetails").unwrap();
    assert_eq!(column_names(&details.columns), ["Id", "Bio", "Picture"]);
    assert!(details.excluded_from_migrations);
    assert!(!customer.excluded_from_migrations);

    // The fragment's key takes its value from the main row
    let id = details.find_column("Id").unwrap();
    assert_eq!(id.value_generated, strata_core::schema::app::ValueGenerated::Never);

    let [fk] = &details.foreign_keys[..] else {
        panic!("expected one foreign key; actual={:?}", details.foreign_keys);
    };
    assert_eq!(fk.name, "FK_CustomerDetails_Customer_Id");
    assert_eq!(fk.on_delete, ReferentialAction::Cascade);
    assert_eq!(details.primary_key.as_ref().unwrap().name, "PK_CustomerDetails");

    let mapping = schema.mapping.entity_type(schema.app.find_entity_type("Customer").unwrap().id);
    assert_eq!(mapping.tables().count(), 2);
    assert_eq!(mapping.table(), Some(customer.id));
}

#[test]
fn key_cannot_move_to_a_fragment() {
    let mut builder = ModelBuilder::new();
    customers(&mut builder);
    builder.entity("Customer", |e| {
        e.split_to_table("CustomerDetails", |f| {
            f.property("Id");
        });
    });

    let err = assert_err!(builder.finalize());
    assert_message!(err, "every fragment repeats the key");
}

#[test]
fn view_mapping_with_definition() {
    let schema = project(|b| {
        b.entity("BlogSummary", |e| {
            e.has_no_key();
            e.property("Title", Type::String);
            e.property("PostCount", Type::I32);
            e.to_view("BlogSummaries")
                .has_schema("reporting")
                .has_definition("SELECT Title, COUNT(*) AS PostCount FROM Blogs");
        });
    });

    assert_empty!(schema.db.tables);
    let view = &schema.db.views[0];
    assert_eq!(view.name.to_string(), "reporting.BlogSummaries");
    assert_eq!(column_names(&view.columns), ["PostCount", "Title"]);
    assert!(view.definition.is_some());
    assert!(schema.db.schemas().contains("reporting"));
}

#[test]
fn view_columns_drop_table_only_facets() {
    let schema = project(|b| {
        customers(b);
        b.entity("Customer", |e| {
            e.property("Name", Type::String).has_default_value("anonymous");
            // Mapping a view drops the conventional table unless one is named
            e.to_table("Customer");
            e.to_view("CustomerView");
        });
    });

    let table = schema.db.find_table("Customer").unwrap();
    assert_eq!(
        table.find_column("Name").unwrap().default,
        Some(DefaultValue::Value("anonymous".into()))
    );

    let view = schema.db.find_view("CustomerView").unwrap();
    let name = view.columns.iter().find(|c| c.name == "Name").unwrap();
    assert_none!(name.default);
    assert_eq!(name.id.store, StoreObjectId::View(view.id));
}

#[test]
fn views_shared_with_different_definitions_are_rejected() {
    let mut builder = ModelBuilder::new();
    builder
        .entity("A", |e| {
            e.has_no_key();
            e.property("X", Type::I32);
            e.to_view("Shared").has_definition("SELECT 1 AS X");
        })
        .entity("B", |e| {
            e.has_no_key();
            e.property("X", Type::I32);
            e.to_view("Shared").has_definition("SELECT 2 AS X");
        });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert_message!(err, "two different definitions");
}

#[test]
fn function_mapping() {
    let schema = project(|b| {
        b.entity("TopBlog", |e| {
            e.has_no_key();
            e.property("Url", Type::String);
            e.to_function("GetTopBlogs");
        });
    });

    let [function] = &schema.db.functions[..] else {
        panic!("expected one function; actual={:?}", schema.db.functions);
    };
    assert_eq!(function.name, "GetTopBlogs");
    assert_eq!(column_names(&function.columns), ["Url"]);
    assert_none!(function.definition);
    assert_eq!(function.entity_types, ["TopBlog"]);
}

#[test]
fn stored_procedures_name_parameters_after_columns() {
    let schema = project(|b| {
        customers(b);
        b.entity("Customer", |e| {
            e.property("Name", Type::String).has_column_name("FullName");
            e.property("Version", Type::Bytes).is_concurrency_token();
            e.insert_using_stored_procedure("Customer_Insert", |p| {
                p.has_parameter("Name");
                p.has_parameter("Id").is_output();
                p.has_result_column("Version");
            });
            e.update_using_stored_procedure("Customer_Update", |p| {
                p.has_parameter("Id");
                p.has_parameter("Version").is_original_value();
                p.has_parameter("Name").has_name("@name");
            });
        });
    });

    let procedures = &schema.db.procedures;
    assert_eq!(procedures.len(), 2);

    let insert = &procedures[0];
    assert_eq!(insert.kind, ProcedureKind::Insert);
    let names: Vec<_> = insert.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["FullName", "Id"]);
    assert_eq!(insert.parameters[1].direction, ParameterDirection::Output);
    assert_eq!(column_names(&insert.result_columns), ["Version"]);
    assert_eq!(insert.result_columns[0].id.store, StoreObjectId::StoredProcedure(insert.id));

    let update = &procedures[1];
    let names: Vec<_> = update.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Id", "Version_Original", "@name"]);
    assert!(update.parameters[1].original_value);
    assert_eq!(update.parameters[2].mapping.property, "Name");
}

#[test]
fn declared_sequence_feeds_a_default() {
    let schema = project(|b| {
        b.has_sequence("OrderNumbers", Some("sales"))
            .starts_at(1000)
            .increments_by(5)
            .use_cache(20);
        b.entity("Order", |e| {
            e.property("Id", Type::I32);
            e.property("Number", Type::I64).use_sequence("OrderNumbers", Some("sales"));
            e.has_key(&["Id"]);
        });
    });

    let sequence = schema.db.sequences.iter().find(|s| s.name.name == "OrderNumbers").unwrap();
    assert_eq!(sequence.ty, db::Type::Integer(8));
    assert_eq!((sequence.start, sequence.increment), (1000, 5));

    let number = schema.db.find_table("Order").unwrap().find_column("Number").unwrap();
    assert_eq!(
        number.default,
        Some(DefaultValue::Sql("NEXT VALUE FOR [sales].[OrderNumbers]".into()))
    );
    assert_eq!(number.value_generated, strata_core::schema::app::ValueGenerated::OnAdd);
}

#[test]
fn undeclared_sequence_is_rejected() {
    let mut builder = ModelBuilder::new();
    builder.entity("Order", |e| {
        e.property("Id", Type::I32).use_sequence("Missing", None);
        e.has_key(&["Id"]);
    });

    let err = assert_err!(builder.finalize());
    assert_message!(err, "`Missing`, which is not declared");
}

#[test]
fn sequence_must_be_integer() {
    let mut builder = ModelBuilder::new();
    builder.has_sequence("Ratio", None).has_type(Type::Decimal);

    let err = assert_err!(builder.finalize());
    assert_message!(err, "sequences must have an integer type");
}

#[test]
fn table_facets() {
    let schema = project(|b| {
        customers(b);
        b.has_default_schema("crm");
        b.entity("Customer", |e| {
            e.has_check_constraint("CK_Customer_Name", "LEN([Name]) > 0");
            e.has_trigger("TR_Customer_Audit");
            e.has_comment("People who buy things");
            e.has_annotation("Clustered", true);
        });
    });

    let customer = &schema.db.tables[0];
    assert_eq!(customer.name.to_string(), "crm.Customer");
    assert_eq!(customer.check_constraints[0].name, "CK_Customer_Name");
    assert_eq!(customer.triggers[0].name, "TR_Customer_Audit");
    assert_eq!(customer.comment.as_deref(), Some("People who buy things"));
    assert_eq!(
        customer.annotations.get("Clustered"),
        Some(&strata_core::schema::Value::Bool(true))
    );
}

#[test]
fn projection_is_independent_of_declaration_order() {
    let forward = project(|b| {
        customers(b);
        b.entity("Order", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_one("Customer", Some("Customer"));
        });
    });
    let backward = project(|b| {
        b.entity("Order", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_one("Customer", Some("Customer"));
        });
        customers(b);
    });

    assert_eq!(forward.db, backward.db);
    assert_eq!(forward.app, backward.app);
}
