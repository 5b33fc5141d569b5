use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{ModelBuilder, ReferentialAction, Type};
use strata_core::schema::db;
use strata_core::schema::Schema;

fn project(f: impl FnOnce(&mut ModelBuilder)) -> Schema {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model))
}

fn blogs(builder: &mut ModelBuilder) {
    builder
        .entity("Blog", |e| {
            e.property("Id", Type::I32);
            e.property("Url", Type::String).has_max_length(200);
            e.has_key(&["Id"]);
        })
        .entity("Post", |e| {
            e.property("Id", Type::I32);
            e.property("Title", Type::String);
            e.has_key(&["Id"]);
            e.has_one("Blog", Some("Blog")).with_many(Some("Posts"));
        });
}

fn column_names(table: &db::Table) -> Vec<&str> {
    table.columns.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn foreign_key_property_and_index_by_convention() {
    let schema = project(blogs);

    let post = schema.db.find_table("Post").unwrap();
    assert_eq!(column_names(post), ["Id", "BlogId", "Title"]);
    // Optional relationship
    assert!(post.find_column("BlogId").unwrap().nullable);

    let [fk] = &post.foreign_keys[..] else {
        panic!("expected one foreign key; actual={:?}", post.foreign_keys);
    };
    assert_eq!(fk.name, "FK_Post_Blog_BlogId");
    assert_eq!(fk.on_delete, ReferentialAction::NoAction);
    assert_eq!(post.column_names(&fk.columns), ["BlogId"]);

    let [index] = &post.indices[..] else {
        panic!("expected one index; actual={:?}", post.indices);
    };
    assert_eq!(index.name, "IX_Post_BlogId");
    assert!(!index.unique);
}

#[test]
fn required_relationship_cascades() {
    let schema = project(|b| {
        blogs(b);
        b.entity("Post", |e| {
            e.has_one("Blog", Some("Blog")).is_required();
        });
    });

    let post = schema.db.find_table("Post").unwrap();
    assert!(!post.find_column("BlogId").unwrap().nullable);
    assert_eq!(post.foreign_keys[0].on_delete, ReferentialAction::Cascade);
}

#[test]
fn foreign_key_to_alternate_key_adds_unique_constraint() {
    let schema = project(|b| {
        blogs(b);
        b.entity("Post", |e| {
            e.property("BlogUrl", Type::String).has_max_length(200);
            e.has_one("Blog", Some("Blog"))
                .has_foreign_key(&["BlogUrl"])
                .has_principal_key(&["Url"])
                .has_constraint_name("FK_Posts_BlogUrl");
        });
    });

    let blog = schema.db.find_table("Blog").unwrap();
    let [unique] = &blog.unique_constraints[..] else {
        panic!("expected one unique constraint; actual={:?}", blog.unique_constraints);
    };
    assert_eq!(unique.name, "AK_Blog_Url");
    assert_eq!(blog.column_names(&unique.columns), ["Url"]);

    let post = schema.db.find_table("Post").unwrap();
    assert_eq!(post.foreign_keys[0].name, "FK_Posts_BlogUrl");
    assert_none!(post.find_column("BlogId"));
}

#[test]
fn foreign_key_type_must_match_principal() {
    let mut builder = ModelBuilder::new();
    blogs(&mut builder);
    builder.entity("Post", |e| {
        e.property("BlogUrl", Type::String);
        e.has_one("Blog", Some("Blog"))
            .has_foreign_key(&["BlogUrl"])
            .has_principal_key(&["Url"]);
    });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert!(err.is_invalid_schema());
    assert_message!(err, "the types must match");
}

#[test]
fn declared_indexes_and_alternate_keys() {
    let schema = project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.has_alternate_key(&["Url"]).has_name("AK_Url");
            e.property("Rating", Type::I32);
            e.has_index(&["Rating", "Url"])
                .is_descending(&[true, false])
                .has_filter("[Rating] > 0");
        });
    });

    let blog = schema.db.find_table("Blog").unwrap();
    assert_eq!(blog.unique_constraints[0].name, "AK_Url");

    let index = &blog.indices[0];
    assert_eq!(index.name, "IX_Blog_Rating_Url");
    assert_eq!(index.filter.as_deref(), Some("[Rating] > 0"));
    let descending: Vec<_> = index.columns.iter().map(|c| c.descending).collect();
    assert_eq!(descending, [true, false]);
    assert_eq!(index.columns[0].table_column(&schema.db).name, "Rating");
}

#[test]
fn index_order_must_match_properties() {
    let mut builder = ModelBuilder::new();
    blogs(&mut builder);
    builder.entity("Blog", |e| {
        e.has_index(&["Url"]).is_descending(&[true, false]);
    });

    let err = assert_err!(builder.finalize());
    assert_message!(err, "lists 2 sort orders for 1 properties");
}

#[test]
fn many_to_many_creates_join_table() {
    let schema = project(|b| {
        b.entity("Post", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_many("Tag", "Tags").with_many("Posts");
        })
        .entity("Tag", |e| {
            e.property("Id", Type::I64);
            e.has_key(&["Id"]);
            e.has_many("Post", "Posts").with_many("Tags");
        });
    });

    let join = schema.db.find_table("PostTag").unwrap();
    assert_eq!(column_names(join), ["PostsId", "TagsId"]);
    assert_eq!(join.find_column("TagsId").unwrap().ty, db::Type::Integer(8));

    let fks: Vec<_> = join.foreign_keys.iter().map(|fk| fk.name.as_str()).collect();
    assert_eq!(fks, ["FK_PostTag_Post_PostsId", "FK_PostTag_Tag_TagsId"]);
    assert!(join
        .foreign_keys
        .iter()
        .all(|fk| fk.on_delete == ReferentialAction::Cascade));

    // The key covers `PostsId` only
    let indices: Vec<_> = join.indices.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(indices, ["IX_PostTag_TagsId"]);

    let post = schema.app.find_entity_type("Post").unwrap();
    let join_entity = schema.app.entity_type(post.skip_navigations[0].join_entity);
    assert_eq!(join_entity.name, "PostTag");
}

#[test]
fn unrelated_types_cannot_share_a_table() {
    let mut builder = ModelBuilder::new();
    builder
        .entity("Person", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.to_table("People");
        })
        .entity("Profile", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.to_table("People");
        });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert!(err.is_invalid_schema());
    assert_message!(err, "share table `People`");
}

#[test]
fn one_to_one_on_key_allows_table_sharing() {
    let schema = project(|b| {
        b.entity("Person", |e| {
            e.property("Id", Type::I32);
            e.property("Name", Type::String);
            e.has_key(&["Id"]);
            e.to_table("People");
        })
        .entity("Profile", |e| {
            e.property("Id", Type::I32);
            e.property("Bio", Type::String);
            e.has_key(&["Id"]);
            e.to_table("People");
            e.has_one("Person", None)
                .with_one(Some("Profile"))
                .has_foreign_key(&["Id"])
                .is_required();
        });
    });

    let people = schema.db.find_table("People").unwrap();
    assert_eq!(column_names(people), ["Id", "Bio", "Name"]);
    assert_eq!(people.entity_types, ["Person", "Profile"]);
    assert_empty!(people.foreign_keys);
}

#[test]
fn conflicting_column_types_are_rejected() {
    let mut builder = ModelBuilder::new();
    builder
        .entity("Person", |e| {
            e.property("Id", Type::I32);
            e.property("Name", Type::String).has_max_length(10);
            e.has_key(&["Id"]);
            e.to_table("People");
        })
        .entity("Profile", |e| {
            e.property("Id", Type::I32);
            e.property("Name", Type::String);
            e.has_key(&["Id"]);
            e.to_table("People");
            e.has_one("Person", None)
                .with_one(None)
                .has_foreign_key(&["Id"])
                .is_required();
        });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert!(err.is_conflicting_column());
    assert_eq!(
        err.to_string(),
        "conflicting column: `Person.Name` and `Profile.Name` are both mapped to column `Name` \
         in `People` but configured with a different type"
    );
}

#[test]
fn table_mapped_type_without_key_is_rejected() {
    let mut builder = ModelBuilder::new();
    builder.entity("Log", |e| {
        e.property("Message", Type::String);
    });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert_message!(err, "`Log` is mapped to table `Log` but has no key");
}

#[test]
fn keyless_type_cannot_map_to_a_table() {
    let mut builder = ModelBuilder::new();
    builder.entity("Log", |e| {
        e.property("Message", Type::String);
        e.has_no_key();
    });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert_message!(err, "keyless entity type `Log`");
}

#[test]
fn undeclared_principal_is_rejected() {
    let mut builder = ModelBuilder::new();
    builder.entity("Post", |e| {
        e.property("Id", Type::I32);
        e.has_key(&["Id"]);
        e.has_one("Blog", Some("Blog"));
    });

    let err = assert_err!(builder.finalize());
    assert_message!(err, "principal `Blog`");
}

#[test]
fn long_generated_names_are_truncated() {
    let mut builder = ModelBuilder::new();
    blogs(&mut builder);
    let model = assert_ok!(builder.finalize());

    let schema = assert_ok!(strata_core::schema::Builder::new()
        .max_identifier_length(12)
        .build(model));

    let post = schema.db.find_table("Post").unwrap();
    assert_eq!(post.foreign_keys[0].name, "FK_Post_Blo~");
    assert_eq!(post.indices[0].name, "IX_Post_Blo~");
    assert_eq!(schema.diagnostics.len(), 2);
}

#[test]
fn truncated_names_that_collide_are_numbered() {
    let mut builder = ModelBuilder::new();
    builder.entity("Order", |e| {
        e.property("Id", Type::I32);
        e.property("CustomerId", Type::I32);
        e.property("CustomerName", Type::String);
        e.has_key(&["Id"]);
        e.has_index(&["CustomerId"]);
        e.has_index(&["CustomerName"]);
    });
    let model = assert_ok!(builder.finalize());

    let schema = assert_ok!(strata_core::schema::Builder::new()
        .max_identifier_length(12)
        .build(model));

    let order = schema.db.find_table("Order").unwrap();
    let mut indices: Vec<_> = order
        .indices
        .iter()
        .map(|i| (i.name.as_str(), order.column_names(&[i.columns[0].column])[0]))
        .collect();
    indices.sort();
    assert_eq!(indices.len(), 2);
    assert_eq!(indices[0].0, "IX_Order_C~1");
    assert_eq!(indices[1].0, "IX_Order_Cu~");
    assert_ne!(indices[0].1, indices[1].1);
}

#[test]
fn truncated_foreign_key_names_are_numbered() {
    let mut builder = ModelBuilder::new();
    builder
        .entity("Person", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
        })
        .entity("Post", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_one("Person", Some("Author"));
            e.has_one("Person", Some("Editor"));
        });
    let model = assert_ok!(builder.finalize());

    let schema = assert_ok!(strata_core::schema::Builder::new()
        .max_identifier_length(16)
        .build(model));

    let post = schema.db.find_table("Post").unwrap();
    let mut names: Vec<_> = post.foreign_keys.iter().map(|fk| fk.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["FK_Post_Person_~", "FK_Post_Person~1"]);
    assert!(names.iter().all(|name| name.chars().count() <= 16));
}

#[test]
fn declared_name_used_twice_is_rejected() {
    let mut builder = ModelBuilder::new();
    builder.entity("Order", |e| {
        e.property("Id", Type::I32);
        e.property("CustomerId", Type::I32);
        e.property("Placed", Type::DateTime);
        e.has_key(&["Id"]);
        e.has_index(&["CustomerId"]).has_name("IX_Same");
        e.has_index(&["Placed"]).has_name("IX_Same");
    });
    let model = assert_ok!(builder.finalize());

    let err = assert_err!(Schema::project(model));
    assert!(err.is_invalid_schema());
    assert_message!(err, "index `IX_Same` on table `Order`");
}

fn column_type<'a>(schema: &'a Schema, table: &str, column: &str) -> &'a db::Type {
    &schema.db.find_table(table).unwrap().find_column(column).unwrap().ty
}

#[test]
fn conventional_foreign_key_copies_key_facets() {
    let schema = project(|b| {
        b.entity("Toy", |e| {
            e.property("Code", Type::String).has_max_length(10);
            e.has_key(&["Code"]);
        })
        .entity("Cat", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_one("Toy", None);
        });
    });

    assert_eq!(column_type(&schema, "Cat", "ToyCode"), column_type(&schema, "Toy", "Code"));
    let toy_code = schema.app.find_entity_type("Cat").unwrap().find_property("ToyCode").unwrap();
    assert_eq!(toy_code.max_length, Some(10));
}

#[test]
fn join_entity_copies_key_facets() {
    let schema = project(|b| {
        b.entity("Toy", |e| {
            e.property("Code", Type::Decimal).has_precision(10).has_scale(0);
            e.has_key(&["Code"]);
            e.has_many("Cat", "Cats").with_many("Toys");
        })
        .entity("Cat", |e| {
            e.property("Name", Type::String).has_max_length(10);
            e.has_key(&["Name"]);
            e.has_many("Toy", "Toys").with_many("Cats");
        });
    });

    assert_eq!(column_type(&schema, "CatToy", "ToysCode"), column_type(&schema, "Toy", "Code"));
    assert_eq!(column_type(&schema, "CatToy", "CatsName"), column_type(&schema, "Cat", "Name"));
}
