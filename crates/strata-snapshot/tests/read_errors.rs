use std_util::prelude::*;
use strata_core::schema::app::{ModelBuilder, Type};
use strata_core::schema::{Schema, Value};
use strata_snapshot::{read, read_model, Generator};

fn snapshot(body: &str) -> String {
    format!(
        "mod snapshot {{\n    pub struct Snapshot;\n    impl ModelSnapshot for Snapshot {{\n        fn build_model(model: &mut ModelBuilder) {{\n{body}\n        }}\n    }}\n}}\n"
    )
}

#[test]
fn unknown_call_names_the_method_and_line() {
    let source = snapshot(
        r#"model.entity("Blog", |b| {
    b.property("Id", Type::I32);
    b.has_primary_index(&["Id"]);
});"#,
    );

    let err = assert_err!(read(&source));
    assert!(err.is_invalid_snapshot());
    assert_message!(err, "`has_primary_index`");
    assert_message!(err, "line 7");
}

#[test]
fn arguments_must_be_literals() {
    let source = snapshot(
        r#"let name = "Blog";
model.entity(name, |b| {});"#,
    );
    let err = assert_err!(read(&source));
    assert!(err.is_invalid_snapshot());

    let source = snapshot(r#"model.entity(NAME, |b| {});"#);
    let err = assert_err!(read(&source));
    assert!(err.is_invalid_snapshot());
    assert_message!(err, "argument 1 of `entity`");

    let source = snapshot(
        r#"model.entity("Blog", |b| {
    b.property("Id", Kind::I32);
});"#,
    );
    let err = assert_err!(read(&source));
    assert_message!(err, "a `Type` variant");
}

#[test]
fn wrong_argument_count() {
    let source = snapshot(r#"model.has_sequence("Numbers");"#);

    let err = assert_err!(read(&source));
    assert!(err.is_invalid_snapshot());
    assert_message!(err, "`has_sequence` takes 2 argument(s)");
}

#[test]
fn seed_rows_only_take_values() {
    let source = snapshot(
        r#"model.entity("Blog", |b| {
    b.property("Id", Type::I32);
    b.has_key(&["Id"]);
    b.has_data()
        .value("Id", 1i64)
        .has_name("Seed");
});"#,
    );

    let err = assert_err!(read(&source));
    assert!(err.is_invalid_snapshot());
    assert_message!(err, "`has_name`");
}

#[test]
fn syntax_errors_are_reported() {
    let err = assert_err!(read_model("mod snapshot { fn build_model(model: &mut ModelBuilder) {"));
    assert!(err.is_invalid_snapshot());
    assert_message!(err, "line");
}

#[test]
fn build_model_is_required() {
    let err = assert_err!(read_model("pub struct Snapshot;"));
    assert!(err.is_invalid_snapshot());
    assert_message!(err, "build_model");
}

#[test]
fn replayed_model_is_validated() {
    let source = snapshot(
        r#"model.entity("Order", |b| {
    b.property("Id", Type::I32)
        .use_sequence("Missing", None);
    b.has_key(&["Id"]);
});"#,
    );

    let err = assert_err!(read(&source));
    assert!(!err.is_invalid_snapshot());
    assert_message!(err, "`Missing`, which is not declared");
}

#[test]
fn hand_written_snapshot() {
    let source = snapshot(
        r#"model.has_default_schema("blogging");
model.entity("Blog", |blog| {
    blog.property("Id", Type::I32)
        .value_generated(ValueGenerated::OnAdd);
    blog.property("Url", Type::String).has_max_length(200);
    blog.has_key(&["Id"]);
});"#,
    );

    let model = assert_ok!(read_model(&source));
    assert_eq!(model.default_schema.as_deref(), Some("blogging"));
    let blog = model.find_entity_type("Blog").unwrap();
    assert_eq!(blog.properties.len(), 2);
}

fn generate_err(f: impl FnOnce(&mut ModelBuilder)) -> strata_core::Error {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let schema = assert_ok!(Schema::project(assert_ok!(builder.finalize())));
    assert_err!(Generator::new("Snapshots", "Snapshot").generate(&schema))
}

#[test]
fn values_without_a_literal_form() {
    let err = generate_err(|b| {
        b.entity("Reading", |e| {
            e.property("Id", Type::I32);
            e.property("Value", Type::F64).has_default_value(f64::NAN);
            e.has_key(&["Id"]);
        });
    });
    assert!(err.is_unsupported_literal());
    assert_message!(err, "Reading.Value");

    let err = generate_err(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_annotation("Handle", Value::opaque(std::time::Duration::from_secs(1)));
        });
    });
    assert!(err.is_unsupported_literal());
    assert_message!(err, "Duration");
}
