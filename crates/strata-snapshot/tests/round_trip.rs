use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{MappingStrategy, ModelBuilder, ReferentialAction, Type};
use strata_core::schema::{Builder, Schema, Value};
use strata_snapshot::Generator;

fn project(f: impl FnOnce(&mut ModelBuilder)) -> Schema {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model))
}

fn generate(schema: &Schema) -> String {
    assert_ok!(Generator::new("Blogging.Migrations", "BloggingModelSnapshot").generate(schema))
}

/// Generates `schema`, reads it back, and checks nothing was lost.
fn round_trip(schema: &Schema) -> String {
    let text = generate(schema);
    let read = assert_ok!(strata_snapshot::read(&text));

    assert_eq!(read.app, schema.app, "\n{text}");
    assert_eq!(*read.db, *schema.db, "\n{text}");
    assert!(strata_migrate::diff(&read.db, &schema.db).is_empty());

    // Generating the replayed model gives the same text
    assert_eq!(generate(&read), text);
    text
}

fn blogs(builder: &mut ModelBuilder) {
    builder
        .entity("Blog", |e| {
            e.property("Id", Type::I32).value_generated_on_add();
            e.property("Url", Type::String).is_required().has_max_length(200);
            e.property("Rating", Type::I32);
            e.has_key(&["Id"]);
            e.has_alternate_key(&["Url"]).has_name("AK_Url");
            e.has_index(&["Rating", "Url"])
                .is_descending(&[true, false])
                .has_filter("[Rating] > 0");
        })
        .entity("Post", |e| {
            e.property("Id", Type::I32);
            e.property("Title", Type::String).has_max_length(120);
            e.property("BlogUrl", Type::String).has_max_length(200);
            e.has_key(&["Id"]);
            e.has_one("Blog", Some("Blog"))
                .with_many(Some("Posts"))
                .has_foreign_key(&["BlogUrl"])
                .has_principal_key(&["Url"])
                .has_constraint_name("FK_Posts_BlogUrl");
        });
}

#[test]
fn relationships_keys_and_indexes() {
    let text = round_trip(&project(|b| {
        blogs(b);
        b.entity("Author", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
        })
        .entity("Post", |e| {
            e.has_one("Author", None).is_required().on_delete(ReferentialAction::Restrict);
            e.has_index(&["Title"]).is_unique().has_name("IX_Title");
        })
        .entity("Blog", |e| {
            e.has_one("Author", Some("Owner")).with_one(Some("Blog"));
        });
    }));

    assert!(text.contains(".has_principal_key(&[\"Url\"])"), "{text}");
    assert!(text.contains(".on_delete(ReferentialAction::Restrict)"), "{text}");
    // Conventional foreign key indexes are written like declared ones
    assert!(text.contains("b.has_index(&[\"AuthorId\"]);"), "{text}");
}

#[test]
fn property_facets_and_literals() {
    round_trip(&project(|b| {
        b.has_default_schema("blogging")
            .product_version("1.2.0")
            .has_annotation("Origin", "tests");
        b.has_sequence("OrderNumbers", Some("sales"))
            .starts_at(1000)
            .increments_by(5)
            .has_min(1000)
            .has_max(9999)
            .is_cyclic()
            .use_cache(20);
        b.has_sequence("Tickets", None).has_type(Type::I32).use_no_cache();
        b.entity("Order", |e| {
            e.property("Id", Type::I32);
            e.property("Number", Type::I64).use_sequence("OrderNumbers", Some("sales"));
            e.property("Title", Type::String)
                .has_default_value("say \"untitled\"\n")
                .use_collation("Latin1_General_CI_AS")
                .has_comment("Shown in lists");
            e.property("Balance", Type::I64).has_default_value(-42i64);
            e.property("Weight", Type::F64).has_default_value(2.5);
            e.property("Archived", Type::Bool).has_default_value(false);
            e.property("Stamp", Type::Bytes)
                .is_concurrency_token()
                .has_default_value(vec![0u8, 255]);
            e.property("Total", Type::Decimal).has_precision(18).has_scale(2);
            e.property("Code", Type::String)
                .has_max_length(3)
                .is_fixed_length()
                .is_nullable();
            e.property("Created", Type::DateTime).has_default_value_sql("CURRENT_TIMESTAMP");
            e.property("Summary", Type::String).has_computed_column_sql("[Title] + '!'", true);
            e.property("Notes", Type::String)
                .has_column_name("Remarks")
                .has_column_type("nvarchar(max)")
                .has_annotation("Sensitive", true);
            e.has_key(&["Id"]).has_name("PK_Orders");
            e.has_check_constraint("CK_Order_Balance", "[Balance] >= 0");
            e.has_trigger("TR_Order_Audit");
            e.has_comment("Customer orders");
            e.has_annotation("Owner", 7u64);
        });
    }));
}

#[test]
fn inheritance_strategies() {
    for strategy in [MappingStrategy::Tph, MappingStrategy::Tpt, MappingStrategy::Tpc] {
        round_trip(&project(|b| {
            b.entity("Animal", |e| {
                e.use_mapping_strategy(strategy);
                e.is_abstract();
                e.property("Id", Type::I32).value_generated_on_add();
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
        }));
    }
}

#[test]
fn custom_discriminator() {
    let text = round_trip(&project(|b| {
        b.entity("Animal", |e| {
            e.property("Id", Type::I32);
            e.property("Kind", Type::String).is_required().has_max_length(20);
            e.has_key(&["Id"]);
            e.has_discriminator("Kind");
            e.has_discriminator_value("a");
        })
        .entity("Cat", |e| {
            e.has_base_type("Animal");
            e.has_discriminator_value("c");
        });
    }));

    assert!(text.contains("b.has_discriminator(\"Kind\");"), "{text}");
}

#[test]
fn owned_and_complex_types() {
    let text = round_trip(&project(|b| {
        b.entity("Order", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.owns_one("ShippingAddress", |a| {
                a.is_required();
                a.property("Street", Type::String);
                a.property("City", Type::String).has_max_length(80);
            });
            e.owns_many("Lines", |l| {
                l.to_table("OrderLines").has_schema("sales");
                l.property("Product", Type::String);
                l.property("Quantity", Type::I32);
            });
            e.owns_one("Details", |d| {
                d.to_json().has_column_name("DetailsJson");
                d.property("Notes", Type::String);
                d.owns_many("Tags", |t| {
                    t.property("Label", Type::String);
                });
            });
        })
        .entity("Customer", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.complex_property("Address", |c| {
                c.is_required();
                c.property("Street", Type::String).is_required();
                c.complex_property("Geo", |g| {
                    g.property("Lat", Type::F64);
                    g.property("Lon", Type::F64);
                });
            });
        });
    }));

    assert!(text.contains("b.owns_many(\"Lines\", |b1| {"), "{text}");
    assert!(text.contains("b1.owns_many(\"Tags\", |b2| {"), "{text}");
    assert!(text.contains("c.complex_property(\"Geo\", |c1| {"), "{text}");
}

#[test]
fn many_to_many() {
    let text = round_trip(&project(|b| {
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
    }));

    assert!(text.contains(".using_entity(\"PostTag\");"), "{text}");
}

#[test]
fn store_objects() {
    round_trip(&project(|b| {
        b.entity("Customer", |e| {
            e.property("Id", Type::I32).value_generated_on_add();
            e.property("Name", Type::String).has_column_name("FullName");
            e.property("Bio", Type::String);
            e.property("Photo", Type::Bytes);
            e.property("Version", Type::Bytes).is_concurrency_token();
            e.has_key(&["Id"]);
            e.to_table("Customers").has_schema("crm");
            e.split_to_table("CustomerDetails", |f| {
                f.has_schema("crm");
                f.property("Bio");
                f.property("Photo").has_column_name("Picture");
                f.exclude_from_migrations();
                f.has_comment("Rarely read");
            });
            e.insert_using_stored_procedure("Customer_Insert", |p| {
                p.has_parameter("Name");
                p.has_parameter("Id").is_output();
                p.has_result_column("Version");
            });
            e.update_using_stored_procedure("Customer_Update", |p| {
                p.has_schema("crm");
                p.has_parameter("Id");
                p.has_parameter("Version").is_original_value();
                p.has_parameter("Name").has_name("@name");
            });
            e.delete_using_stored_procedure("Customer_Delete", |p| {
                p.has_parameter("Id");
                p.has_definition("DELETE FROM [crm].[Customers] WHERE [Id] = @Id");
            });
        })
        .entity("BlogSummary", |e| {
            e.has_no_key();
            e.property("Title", Type::String);
            e.property("PostCount", Type::I32);
            e.to_view("BlogSummaries")
                .has_schema("reporting")
                .has_definition("SELECT Title, COUNT(*) AS PostCount FROM Blogs");
        })
        .entity("TopBlog", |e| {
            e.has_no_key();
            e.property("Url", Type::String);
            e.to_function("GetTopBlogs");
        })
        .entity("Legacy", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.to_table("Legacy").exclude_from_migrations();
        });
    }));
}

#[test]
fn projection_options_are_recorded() {
    let mut model = ModelBuilder::new();
    blogs(&mut model);
    model
        .entity("Animal", |e| {
            e.use_mapping_strategy(MappingStrategy::Tpc);
            e.is_abstract();
            e.property("Id", Type::I32).value_generated_on_add();
            e.has_key(&["Id"]);
        })
        .entity("Cat", |e| {
            e.has_base_type("Animal");
            e.property("Lives", Type::I32);
        });
    let model = assert_ok!(model.finalize());

    let schema = assert_ok!(Builder::new()
        .default_schema("blogging")
        .max_identifier_length(16)
        .tpc_sequences(false)
        .build(model));
    assert_eq!(schema.db.default_schema.as_deref(), Some("blogging"));
    assert_empty!(schema.db.sequences);

    let text = round_trip(&schema);
    assert!(text.contains("fn configure(builder: &mut Builder) {"), "{text}");
    assert!(text.contains("builder.default_schema(\"blogging\");"), "{text}");
    assert!(text.contains("builder.max_identifier_length(16);"), "{text}");
    assert!(text.contains("builder.tpc_sequences(false);"), "{text}");

    // Recorded options win over the caller's
    let read = assert_ok!(strata_snapshot::read_with(
        &text,
        Builder::new().max_identifier_length(64)
    ));
    assert_eq!(*read.db, *schema.db);
}

#[test]
fn default_options_are_not_written() {
    let text = generate(&project(blogs));
    assert!(!text.contains("fn configure"), "{text}");
}

#[test]
fn seed_data() {
    let text = round_trip(&project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.has_data()
                .value("Id", 1)
                .value("Url", "https://blog.example")
                .value("Rating", Value::Null);
        })
        .entity("Animal", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
        })
        .entity("Cat", |e| {
            e.has_base_type("Animal");
            e.property("Lives", Type::I32);
            e.has_data().value("Id", 7).value("Lives", 9);
        });
    }));

    assert!(text.contains("b.has_data()\n"), "{text}");
    assert!(text.contains(".value(\"Url\", \"https://blog.example\")"), "{text}");
    assert!(text.contains(".value(\"Rating\", Value::Null)"), "{text}");
    assert!(text.contains(".value(\"Lives\", 9i64);"), "{text}");
    // The discriminator is filled in by projection, not recorded
    assert!(!text.contains(".value(\"Discriminator\""), "{text}");
}

#[test]
fn output_is_deterministic() {
    let forward = project(|b| {
        blogs(b);
        b.has_sequence("B", None);
        b.has_sequence("A", None);
    });
    let backward = project(|b| {
        b.has_sequence("A", None);
        b.has_sequence("B", None);
        b.entity("Post", |e| {
            e.property("BlogUrl", Type::String).has_max_length(200);
            e.property("Title", Type::String).has_max_length(120);
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
        });
        blogs(b);
    });

    assert_eq!(generate(&forward), generate(&backward));
    assert_eq!(generate(&forward), generate(&forward));
}

#[test]
fn header_and_product_version() {
    let schema = project(|b| {
        b.product_version("1.0.0");
        blogs(b);
    });

    let text = generate(&schema);
    assert!(text.starts_with("// <auto-generated />\nmod blogging_migrations {\n"), "{text}");
    assert!(text.contains("pub struct BloggingModelSnapshot;"), "{text}");
    assert!(text.contains("impl ModelSnapshot for BloggingModelSnapshot {"), "{text}");
    assert!(text.contains("model.product_version(\"1.0.0\");"), "{text}");

    // The generating tool's version replaces the model's
    let text = assert_ok!(Generator::new("Blogging", "Snapshot")
        .product_version("2.0.0")
        .generate(&schema));
    assert!(text.contains("model.product_version(\"2.0.0\");"), "{text}");
    assert!(!text.contains("1.0.0"), "{text}");

    let read = assert_ok!(strata_snapshot::read(&text));
    assert_eq!(read.app.product_version.as_deref(), Some("2.0.0"));
}

#[test]
fn empty_model() {
    let text = round_trip(&project(|_| {}));
    assert!(text.contains("fn build_model(model: &mut ModelBuilder) {\n        }"), "{text}");
}
