use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::schema::app::{MappingStrategy, ModelBuilder, ReferentialAction, Type};
use strata_core::schema::db::{self, RenameHints, RenameReason};
use strata_core::schema::{Schema, Value};
use strata_migrate::{Migration, Operation};

fn project(f: impl FnOnce(&mut ModelBuilder)) -> std::sync::Arc<db::Schema> {
    let mut builder = ModelBuilder::new();
    f(&mut builder);
    let model = assert_ok!(builder.finalize());
    assert_ok!(Schema::project(model)).db
}

fn blogs(builder: &mut ModelBuilder) {
    builder.entity("Blog", |e| {
        e.property("Id", Type::I32).value_generated_on_add();
        e.property("Url", Type::String);
        e.property("Name", Type::String);
        e.has_key(&["Id"]);
    });
    posts(builder);
}

fn posts(builder: &mut ModelBuilder) {
    builder.entity("Post", |e| {
        e.property("Id", Type::I32).value_generated_on_add();
        e.property("Title", Type::String);
        e.has_key(&["Id"]);
        e.has_one("Blog", Some("Blog")).with_many(Some("Posts"));
    });
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

fn names(migration: &Migration) -> Vec<String> {
    migration.operations.iter().map(|op| op.to_string()).collect()
}

fn position(migration: &Migration, name: &str) -> usize {
    names(migration)
        .iter()
        .position(|op| op == name)
        .unwrap_or_else(|| panic!("missing `{name}` in {:?}", names(migration)))
}

#[test]
fn same_model_needs_no_migration() {
    let models: Vec<Box<dyn Fn(&mut ModelBuilder)>> = vec![
        Box::new(blogs),
        Box::new(|b| animals(b, MappingStrategy::Tph)),
        Box::new(|b| animals(b, MappingStrategy::Tpt)),
        Box::new(|b| animals(b, MappingStrategy::Tpc)),
        Box::new(|b| {
            b.entity("Customer", |e| {
                e.property("Id", Type::I32);
                e.property("Name", Type::String);
                e.property("Bio", Type::String);
                e.has_key(&["Id"]);
                e.split_to_table("CustomerDetails", |f| {
                    f.property("Bio");
                });
            });
        }),
        Box::new(|b| {
            b.entity("Order", |e| {
                e.property("Id", Type::I32);
                e.has_key(&["Id"]);
                e.owns_one("Details", |d| {
                    d.to_json();
                    d.property("Notes", Type::String);
                });
            });
        }),
    ];

    for model in models {
        let previous = project(|b| model(b));
        let next = project(|b| model(b));

        let migration = strata_migrate::diff(&previous, &next);
        assert!(migration.is_empty(), "{:?}", names(&migration));
        assert_empty!(migration.renames);
    }
}

#[test]
fn new_model_creates_principals_first() {
    let migration = strata_migrate::diff(&db::Schema::default(), &project(blogs));

    assert_eq!(
        names(&migration),
        [
            "CreateTable(Blog)",
            "CreateTable(Post)",
            "AddIndex(Post.IX_Post_BlogId)"
        ]
    );

    let Operation::CreateTable(post) = &migration.operations[1] else {
        panic!("expected CreateTable; actual={:?}", migration.operations[1]);
    };
    let [fk] = &post.foreign_keys[..] else {
        panic!("expected one inline foreign key; actual={:?}", post.foreign_keys);
    };
    assert_eq!(fk.name, "FK_Post_Blog_BlogId");
    assert_eq!(fk.principal_table.name, "Blog");
    assert_eq!(fk.columns, ["BlogId"]);
    assert_eq!(post.primary_key.as_ref().unwrap().columns, ["Id"]);
    assert!(!migration.is_destructive());
}

#[test]
fn removed_model_drops_dependents_first() {
    let migration = strata_migrate::diff(&project(blogs), &db::Schema::default());

    assert_eq!(names(&migration), ["DropTable(Post)", "DropTable(Blog)"]);
    assert!(migration.is_destructive());
}

#[test]
fn foreign_key_cycle_is_added_after_tables() {
    let model = project(|b| {
        b.entity("Employee", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_one("Team", Some("Team"));
        })
        .entity("Team", |e| {
            e.property("Id", Type::I32);
            e.has_key(&["Id"]);
            e.has_one("Employee", Some("Lead"));
        });
    });

    let migration = strata_migrate::diff(&db::Schema::default(), &model);
    let ops = names(&migration);

    let deferred: Vec<_> = ops
        .iter()
        .filter(|op| op.starts_with("AddForeignKey("))
        .collect();
    assert_eq!(deferred.len(), 1, "{ops:?}");
    let add = ops.iter().position(|op| op == deferred[0]).unwrap();
    assert!(position(&migration, "CreateTable(Team)") < add);

    // Dropping the same model breaks the cycle the other way
    let migration = strata_migrate::diff(&model, &db::Schema::default());
    let ops = names(&migration);
    assert!(ops[0].starts_with("DropForeignKey("), "{ops:?}");
    assert_eq!(&ops[1..], ["DropTable(Employee)", "DropTable(Team)"]);
}

#[test]
fn renamed_table_is_a_single_operation() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.to_table("Blogs");
        });
    });

    let migration = strata_migrate::diff(&previous, &next);
    let rename = position(&migration, "RenameTable(Blog -> Blogs)");
    assert_eq!(rename, 0, "{:?}", names(&migration));

    // Foreign keys of `Post` now point at `Blogs`
    for op in &migration.operations[1..] {
        match op {
            Operation::DropForeignKey(_) | Operation::AddForeignKey(_) => {}
            _ => panic!("unexpected operation {op}"),
        }
    }

    let [rename] = &migration.renames[..] else {
        panic!("expected one rename; actual={:?}", migration.renames);
    };
    assert_eq!(rename.reason, RenameReason::SharedEntityType);
    assert!(!migration.is_destructive());
}

#[test]
fn new_schema_is_ensured_before_use() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.entity("Post", |e| {
            e.to_table("Post").has_schema("blogging");
        });
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        &names(&migration)[..2],
        ["EnsureSchema(blogging)", "RenameTable(Post -> blogging.Post)"]
    );
}

#[test]
fn required_column_is_destructive() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.property("Url", Type::String).is_required();
        });
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(names(&migration), ["AlterColumn(Blog.Url)"]);

    let Operation::AlterColumn(alter) = &migration.operations[0] else {
        panic!("expected AlterColumn");
    };
    assert!(alter.old_column.nullable);
    assert!(!alter.column.nullable);
    assert!(migration.is_destructive());
}

#[test]
fn computed_columns_are_added_last() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.property("Display", Type::String)
                .has_computed_column_sql("[Name] + ' ' + [Url]", false);
            e.property("Rating", Type::I32);
        });
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        ["AddColumn(Blog.Rating)", "AddColumn(Blog.Display)"]
    );
}

#[test]
fn dropped_columns_go_before_renames() {
    let previous = project(blogs);
    let next = project(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32).value_generated_on_add();
            e.property("Name", Type::String).has_column_name("Title");
            e.has_key(&["Id"]);
        });
        posts(b);
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        ["DropColumn(Blog.Url)", "RenameColumn(Blog.Name -> Title)"]
    );
    assert_eq!(migration.renames[0].reason, RenameReason::SharedProperty);
    assert!(migration.is_destructive());
}

#[test]
fn rename_hints_are_honored() {
    let previous = project(blogs);
    let next = project(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32).value_generated_on_add();
            e.property("Address", Type::String);
            e.property("Title", Type::String);
            e.has_key(&["Id"]);
        });
        posts(b);
    });

    // Two candidates with identical definitions are ambiguous
    let migration = strata_migrate::diff(&previous, &next);
    assert_empty!(migration.renames);

    let mut hints = RenameHints::new();
    hints.add_column_hint("Blog", "Url", "Address");
    let migration = strata_migrate::diff_with_hints(&previous, &next, &hints);
    let mut ops = names(&migration);
    ops.sort();
    assert_eq!(
        ops,
        [
            "RenameColumn(Blog.Name -> Title)",
            "RenameColumn(Blog.Url -> Address)"
        ]
    );
}

#[test]
fn delete_behavior_change_replaces_foreign_key() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.entity("Post", |e| {
            e.has_one("Blog", Some("Blog"))
                .with_many(Some("Posts"))
                .on_delete(ReferentialAction::Cascade);
        });
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        [
            "DropForeignKey(Post.FK_Post_Blog_BlogId)",
            "AddForeignKey(Post.FK_Post_Blog_BlogId)"
        ]
    );

    let Operation::AddForeignKey(add) = &migration.operations[1] else {
        panic!("expected AddForeignKey");
    };
    assert_eq!(add.foreign_key.on_delete, ReferentialAction::Cascade);
}

#[test]
fn index_and_constraint_changes() {
    let previous = project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.has_index(&["Url"]);
            e.has_check_constraint("CK_Blog_Url", "LEN([Url]) > 0");
        });
    });
    let next = project(|b| {
        blogs(b);
        b.entity("Blog", |e| {
            e.has_index(&["Url"]).has_name("IX_Url");
            e.has_check_constraint("CK_Blog_Url", "LEN([Url]) > 4");
            e.has_trigger("TR_Blog_Audit");
        });
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        [
            "DropCheckConstraint(Blog.CK_Blog_Url)",
            "RenameIndex(Blog.IX_Blog_Url -> IX_Url)",
            "AddCheckConstraint(Blog.CK_Blog_Url)",
            "AddTrigger(Blog.TR_Blog_Audit)"
        ]
    );
}

#[test]
fn sequence_operations() {
    let previous = project(|b| {
        b.has_sequence("Numbers", None).increments_by(1);
        b.has_sequence("Retired", None);
    });
    let next = project(|b| {
        b.has_sequence("Numbers", Some("sales"))
            .increments_by(10)
            .starts_at(500);
        b.has_sequence("Invoices", None);
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        [
            "DropSequence(Retired)",
            "EnsureSchema(sales)",
            "RenameSequence(Numbers -> sales.Numbers)",
            "CreateSequence(Invoices)",
            "AlterSequence(sales.Numbers)",
            "RestartSequence(sales.Numbers, 500)"
        ]
    );
}

#[test]
fn view_definition_change_recreates_view() {
    let summary = |b: &mut ModelBuilder, sql: &str| {
        b.entity("BlogSummary", |e| {
            e.has_no_key();
            e.property("Url", Type::String);
            e.to_view("BlogSummaries").has_definition(sql);
        });
    };
    let previous = project(|b| summary(b, "SELECT Url FROM Blog"));
    let next = project(|b| summary(b, "SELECT DISTINCT Url FROM Blog"));

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        ["DropView(BlogSummaries)", "CreateView(BlogSummaries)"]
    );

    let Operation::CreateView(view) = &migration.operations[1] else {
        panic!("expected CreateView");
    };
    assert_eq!(view.definition, "SELECT DISTINCT Url FROM Blog");
}

#[test]
fn database_annotations() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.has_annotation("Collation", "Latin1_General_CI_AS");
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(names(&migration), ["AlterDatabase"]);
}

#[test]
fn adding_and_removing_are_inverse() {
    let previous = project(blogs);
    let next = project(|b| {
        blogs(b);
        b.entity("Tag", |e| {
            e.property("Id", Type::I32);
            e.property("Label", Type::String);
            e.has_key(&["Id"]);
        });
    });

    let forward = strata_migrate::diff(&previous, &next);
    let backward = strata_migrate::diff(&next, &previous);

    assert_eq!(names(&forward), ["CreateTable(Tag)"]);
    assert_eq!(names(&backward), ["DropTable(Tag)"]);
}

fn seeded_blogs(builder: &mut ModelBuilder, rows: &[(i32, &str)]) {
    builder.entity("Blog", |e| {
        e.property("Id", Type::I32).value_generated_on_add();
        e.property("Url", Type::String);
        e.property("Name", Type::String);
        e.has_key(&["Id"]);
        for (id, url) in rows {
            e.has_data().value("Id", *id).value("Url", *url);
        }
    });
    posts(builder);
}

#[test]
fn seed_rows_are_inserted_after_their_table() {
    let next = project(|b| seeded_blogs(b, &[(1, "a.example"), (2, "b.example")]));
    let migration = strata_migrate::diff(&db::Schema::default(), &next);

    assert_eq!(
        names(&migration),
        [
            "CreateTable(Blog)",
            "CreateTable(Post)",
            "InsertData(Blog)",
            "InsertData(Blog)",
            "AddIndex(Post.IX_Post_BlogId)"
        ]
    );

    let Operation::InsertData(insert) = &migration.operations[2] else {
        panic!("expected InsertData; actual={:?}", migration.operations[2]);
    };
    assert_eq!(insert.columns, ["Id", "Url"]);
    assert_eq!(insert.values, [Value::from(1), Value::from("a.example")]);
    assert!(!migration.is_destructive());
}

#[test]
fn seed_rows_are_matched_by_key() {
    let previous = project(|b| seeded_blogs(b, &[(1, "a.example"), (2, "b.example")]));
    let next = project(|b| seeded_blogs(b, &[(1, "a2.example"), (3, "c.example")]));

    let migration = strata_migrate::diff(&previous, &next);
    assert_eq!(
        names(&migration),
        ["DeleteData(Blog)", "UpdateData(Blog)", "InsertData(Blog)"]
    );
    assert!(migration.is_destructive());

    let [Operation::DeleteData(delete), Operation::UpdateData(update), Operation::InsertData(insert)] =
        &migration.operations[..]
    else {
        panic!("unexpected operations {:?}", migration.operations);
    };
    assert_eq!(delete.key_columns, ["Id"]);
    assert_eq!(delete.key_values, [Value::from(2)]);
    assert_eq!(update.key_values, [Value::from(1)]);
    assert_eq!(update.columns, ["Url"]);
    assert_eq!(update.values, [Value::from("a2.example")]);
    assert_eq!(insert.values, [Value::from(3), Value::from("c.example")]);

    assert_empty!(strata_migrate::diff(&next, &next).operations);
}

#[test]
fn seed_rows_follow_added_columns() {
    let previous = project(|b| seeded_blogs(b, &[(1, "a.example")]));
    let next = project(|b| {
        b.entity("Blog", |e| {
            e.property("Id", Type::I32).value_generated_on_add();
            e.property("Url", Type::String);
            e.property("Name", Type::String);
            e.property("Rating", Type::I32);
            e.has_key(&["Id"]);
            e.has_data()
                .value("Id", 1)
                .value("Url", "a.example")
                .value("Rating", 5);
        });
        posts(b);
    });

    let migration = strata_migrate::diff(&previous, &next);
    assert!(position(&migration, "AddColumn(Blog.Rating)") < position(&migration, "UpdateData(Blog)"));

    let Some(Operation::UpdateData(update)) = migration.operations.last() else {
        panic!("expected UpdateData last; actual={:?}", names(&migration));
    };
    assert_eq!(update.columns, ["Rating"]);
}

#[test]
fn dropped_table_deletes_no_rows() {
    let previous = project(|b| seeded_blogs(b, &[(1, "a.example")]));
    let migration = strata_migrate::diff(&previous, &db::Schema::default());

    assert_eq!(names(&migration), ["DropTable(Post)", "DropTable(Blog)"]);
}
