mod call;
use call::{chain, invalid, Call};

use strata_core::schema::app::{
    ComplexPropertyBuilder, EntityTypeBuilder, FragmentBuilder, MappingStrategy, Model,
    ModelBuilder, ProcedureBuilder, PropertyBuilder, ReferentialAction, Type, ValueGenerated,
};
use strata_core::schema::{Builder, Schema};
use strata_core::{Error, Result};

use syn::spanned::Spanned;
use tracing::debug;

/// Reads a snapshot and projects its model with the options it records.
pub fn read(source: &str) -> Result<Schema> {
    read_with(source, &Builder::new())
}

/// Reads a snapshot and projects its model with `builder`. Options the
/// snapshot records replace the builder's.
pub fn read_with(source: &str, builder: &Builder) -> Result<Schema> {
    let file = parse(source)?;

    let mut builder = builder.clone();
    if let Some((sig, block)) = find_function(&file.items, "configure") {
        let receiver = receiver(sig, "the projection builder")?;
        for stmt in &block.stmts {
            builder_chain(&mut builder, &chain(stmt, &receiver)?)?;
        }
    }

    builder.build(replay(&file)?)
}

/// Replays the `build_model` body of a snapshot on a fresh
/// [`ModelBuilder`] and finalizes the result.
pub fn read_model(source: &str) -> Result<Model> {
    replay(&parse(source)?)
}

fn parse(source: &str) -> Result<syn::File> {
    syn::parse_file(source).map_err(|err| invalid(err.span(), err))
}

fn replay(file: &syn::File) -> Result<Model> {
    let Some((sig, block)) = find_function(&file.items, "build_model") else {
        return Err(Error::invalid_snapshot("no `build_model` function found"));
    };
    let receiver = receiver(sig, "the model builder")?;

    let mut model = ModelBuilder::new();
    for stmt in &block.stmts {
        model_chain(&mut model, &chain(stmt, &receiver)?)?;
    }

    let model = model.finalize()?;
    debug!(entity_types = model.entity_types.len(), "read snapshot");
    Ok(model)
}

/// Name of the single parameter of a snapshot function.
fn receiver(sig: &syn::Signature, what: &str) -> Result<String> {
    match sig.inputs.first() {
        Some(syn::FnArg::Typed(arg)) => match &*arg.pat {
            syn::Pat::Ident(pat) => Ok(pat.ident.to_string()),
            other => Err(invalid(other.span(), format!("expected {what} parameter"))),
        },
        _ => Err(invalid(sig.span(), format!("`{}` takes {what}", sig.ident))),
    }
}

fn find_function<'a>(items: &'a [syn::Item], name: &str) -> Option<(&'a syn::Signature, &'a syn::Block)> {
    for item in items {
        let found = match item {
            syn::Item::Fn(function) if function.sig.ident == name => {
                Some((&function.sig, &*function.block))
            }
            syn::Item::Mod(module) => module
                .content
                .as_ref()
                .and_then(|(_, items)| find_function(items, name)),
            syn::Item::Impl(implementation) => {
                implementation.items.iter().find_map(|item| match item {
                    syn::ImplItem::Fn(function) if function.sig.ident == name => {
                        Some((&function.sig, &function.block))
                    }
                    _ => None,
                })
            }
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn builder_chain(builder: &mut Builder, calls: &[Call<'_>]) -> Result<()> {
    for call in calls {
        call.trace("builder");
        match call.name() {
            "default_schema" => {
                call.arity(1)?;
                builder.default_schema(&call.string(0)?);
            }
            "max_identifier_length" => {
                call.arity(1)?;
                builder.max_identifier_length(call.integer(0)?);
            }
            "tpc_sequences" => {
                call.arity(1)?;
                builder.tpc_sequences(call.boolean(0)?);
            }
            _ => return Err(call.unknown("the projection builder")),
        }
    }
    Ok(())
}

fn model_chain(model: &mut ModelBuilder, calls: &[Call<'_>]) -> Result<()> {
    let Some((call, rest)) = calls.split_first() else {
        return Ok(());
    };
    call.trace("model");

    match call.name() {
        "product_version" => {
            call.arity(1)?;
            model.product_version(&call.string(0)?);
        }
        "has_default_schema" => {
            call.arity(1)?;
            model.has_default_schema(&call.string(0)?);
        }
        "has_annotation" => {
            call.arity(2)?;
            model.has_annotation(&call.string(0)?, call.value(1)?);
        }
        "has_sequence" => {
            call.arity(2)?;
            let schema = call.opt_string(1)?;
            let mut sequence = model.has_sequence(&call.string(0)?, schema.as_deref());
            for call in rest {
                call.trace("sequence");
                match call.name() {
                    "has_type" => {
                        call.arity(1)?;
                        sequence.has_type(call.variant(0, "Type", Type::from_name)?);
                    }
                    "starts_at" => {
                        call.arity(1)?;
                        sequence.starts_at(call.integer(0)?);
                    }
                    "increments_by" => {
                        call.arity(1)?;
                        sequence.increments_by(call.integer(0)?);
                    }
                    "has_min" => {
                        call.arity(1)?;
                        sequence.has_min(call.integer(0)?);
                    }
                    "has_max" => {
                        call.arity(1)?;
                        sequence.has_max(call.integer(0)?);
                    }
                    "is_cyclic" => {
                        call.arity(0)?;
                        sequence.is_cyclic();
                    }
                    "use_cache" => {
                        call.arity(1)?;
                        sequence.use_cache(call.integer(0)?);
                    }
                    "use_no_cache" => {
                        call.arity(0)?;
                        sequence.use_no_cache();
                    }
                    "has_annotation" => {
                        call.arity(2)?;
                        sequence.has_annotation(&call.string(0)?, call.value(1)?);
                    }
                    _ => return Err(call.unknown("a sequence")),
                }
            }
            return Ok(());
        }
        "entity" => {
            call.arity(2)?;
            let name = call.string(0)?;
            let closure = call.closure(1)?;
            let mut result = Ok(());
            model.entity(&name, |b| {
                result = closure.replay(|calls| entity_chain(b, calls));
            });
            result?;
        }
        _ => return Err(call.unknown("the model")),
    }

    model_chain(model, rest)
}

fn entity_chain(b: &mut EntityTypeBuilder<'_>, calls: &[Call<'_>]) -> Result<()> {
    let Some((call, rest)) = calls.split_first() else {
        return Ok(());
    };
    call.trace(b.name());

    match call.name() {
        "has_base_type" => {
            call.arity(1)?;
            b.has_base_type(&call.string(0)?);
        }
        "is_abstract" => {
            call.arity(0)?;
            b.is_abstract();
        }
        "use_mapping_strategy" => {
            call.arity(1)?;
            b.use_mapping_strategy(call.variant(0, "MappingStrategy", MappingStrategy::from_name)?);
        }
        "property" => {
            call.arity(2)?;
            let ty = call.variant(1, "Type", Type::from_name)?;
            return property_chain(&mut b.property(&call.string(0)?, ty), rest);
        }
        "complex_property" => {
            call.arity(2)?;
            let name = call.string(0)?;
            let closure = call.closure(1)?;
            let mut result = Ok(());
            b.complex_property(&name, |c| {
                result = closure.replay(|calls| complex_chain(c, calls));
            });
            result?;
        }
        "has_key" | "has_alternate_key" => {
            call.arity(1)?;
            let properties = call.strings(0)?;
            let properties = refs(&properties);
            let mut key = if call.name() == "has_key" {
                b.has_key(&properties)
            } else {
                b.has_alternate_key(&properties)
            };
            for call in rest {
                call.trace("key");
                match call.name() {
                    "has_name" => {
                        call.arity(1)?;
                        key.has_name(&call.string(0)?);
                    }
                    "has_annotation" => {
                        call.arity(2)?;
                        key.has_annotation(&call.string(0)?, call.value(1)?);
                    }
                    _ => return Err(call.unknown("a key")),
                }
            }
            return Ok(());
        }
        "has_no_key" => {
            call.arity(0)?;
            b.has_no_key();
        }
        "has_index" => {
            call.arity(1)?;
            let properties = call.strings(0)?;
            let mut index = b.has_index(&refs(&properties));
            for call in rest {
                call.trace("index");
                match call.name() {
                    "is_unique" => {
                        call.arity(0)?;
                        index.is_unique();
                    }
                    "has_name" => {
                        call.arity(1)?;
                        index.has_name(&call.string(0)?);
                    }
                    "has_filter" => {
                        call.arity(1)?;
                        index.has_filter(&call.string(0)?);
                    }
                    "is_descending" => {
                        call.arity(1)?;
                        index.is_descending(&call.bools(0)?);
                    }
                    "has_annotation" => {
                        call.arity(2)?;
                        index.has_annotation(&call.string(0)?, call.value(1)?);
                    }
                    _ => return Err(call.unknown("an index")),
                }
            }
            return Ok(());
        }
        "has_one" => {
            call.arity(2)?;
            let navigation = call.opt_string(1)?;
            let mut relationship = b.has_one(&call.string(0)?, navigation.as_deref());
            for call in rest {
                call.trace("relationship");
                match call.name() {
                    "with_many" => {
                        call.arity(1)?;
                        relationship.with_many(call.opt_string(0)?.as_deref());
                    }
                    "with_one" => {
                        call.arity(1)?;
                        relationship.with_one(call.opt_string(0)?.as_deref());
                    }
                    "has_foreign_key" => {
                        call.arity(1)?;
                        relationship.has_foreign_key(&refs(&call.strings(0)?));
                    }
                    "has_principal_key" => {
                        call.arity(1)?;
                        relationship.has_principal_key(&refs(&call.strings(0)?));
                    }
                    "on_delete" => {
                        call.arity(1)?;
                        relationship.on_delete(call.variant(
                            0,
                            "ReferentialAction",
                            ReferentialAction::from_name,
                        )?);
                    }
                    "is_required" => {
                        call.arity(0)?;
                        relationship.is_required();
                    }
                    "has_constraint_name" => {
                        call.arity(1)?;
                        relationship.has_constraint_name(&call.string(0)?);
                    }
                    "has_annotation" => {
                        call.arity(2)?;
                        relationship.has_annotation(&call.string(0)?, call.value(1)?);
                    }
                    _ => return Err(call.unknown("a relationship")),
                }
            }
            return Ok(());
        }
        "has_many" => {
            call.arity(2)?;
            let mut skip = b.has_many(&call.string(0)?, &call.string(1)?);
            for call in rest {
                call.trace("many-to-many navigation");
                match call.name() {
                    "with_many" => {
                        call.arity(1)?;
                        skip.with_many(&call.string(0)?);
                    }
                    "using_entity" => {
                        call.arity(1)?;
                        skip.using_entity(&call.string(0)?);
                    }
                    _ => return Err(call.unknown("a many-to-many navigation")),
                }
            }
            return Ok(());
        }
        "owns_one" | "owns_many" => {
            call.arity(2)?;
            let navigation = call.string(0)?;
            let closure = call.closure(1)?;
            let mut result = Ok(());
            if call.name() == "owns_one" {
                b.owns_one(&navigation, |owned| {
                    result = closure.replay(|calls| entity_chain(owned, calls));
                });
            } else {
                b.owns_many(&navigation, |owned| {
                    result = closure.replay(|calls| entity_chain(owned, calls));
                });
            }
            result?;
        }
        "is_required" => {
            call.arity(0)?;
            b.is_required();
        }
        "to_json" => {
            call.arity(0)?;
            let mut json = b.to_json();
            for call in rest {
                call.trace("JSON mapping");
                match call.name() {
                    "has_column_name" => {
                        call.arity(1)?;
                        json.has_column_name(&call.string(0)?);
                    }
                    _ => return Err(call.unknown("a JSON mapping")),
                }
            }
            return Ok(());
        }
        "to_table" => {
            call.arity(1)?;
            let mut table = b.to_table(&call.string(0)?);
            for call in rest {
                call.trace("table");
                match call.name() {
                    "has_schema" => {
                        call.arity(1)?;
                        table.has_schema(&call.string(0)?);
                    }
                    "exclude_from_migrations" => {
                        call.arity(0)?;
                        table.exclude_from_migrations();
                    }
                    "has_comment" => {
                        call.arity(1)?;
                        table.has_comment(&call.string(0)?);
                    }
                    _ => return Err(call.unknown("a table")),
                }
            }
            return Ok(());
        }
        "has_no_table" => {
            call.arity(0)?;
            b.has_no_table();
        }
        "to_view" | "to_function" => {
            call.arity(1)?;
            let name = call.string(0)?;
            let mut object = if call.name() == "to_view" {
                b.to_view(&name)
            } else {
                b.to_function(&name)
            };
            for call in rest {
                call.trace("store object");
                match call.name() {
                    "has_schema" => {
                        call.arity(1)?;
                        object.has_schema(&call.string(0)?);
                    }
                    "has_definition" => {
                        call.arity(1)?;
                        object.has_definition(&call.string(0)?);
                    }
                    _ => return Err(call.unknown("a store object")),
                }
            }
            return Ok(());
        }
        "insert_using_stored_procedure"
        | "update_using_stored_procedure"
        | "delete_using_stored_procedure" => {
            call.arity(2)?;
            let name = call.string(0)?;
            let closure = call.closure(1)?;
            let mut result = Ok(());
            match call.name() {
                "insert_using_stored_procedure" => b.insert_using_stored_procedure(&name, |p| {
                    result = closure.replay(|calls| procedure_chain(p, calls));
                }),
                "update_using_stored_procedure" => b.update_using_stored_procedure(&name, |p| {
                    result = closure.replay(|calls| procedure_chain(p, calls));
                }),
                _ => b.delete_using_stored_procedure(&name, |p| {
                    result = closure.replay(|calls| procedure_chain(p, calls));
                }),
            };
            result?;
        }
        "split_to_table" | "split_to_view" => {
            call.arity(2)?;
            let name = call.string(0)?;
            let closure = call.closure(1)?;
            let mut result = Ok(());
            if call.name() == "split_to_table" {
                b.split_to_table(&name, |f| {
                    result = closure.replay(|calls| fragment_chain(f, calls));
                });
            } else {
                b.split_to_view(&name, |f| {
                    result = closure.replay(|calls| fragment_chain(f, calls));
                });
            }
            result?;
        }
        "has_discriminator" => {
            call.arity(1)?;
            let mut discriminator = b.has_discriminator(&call.string(0)?);
            for call in rest {
                call.trace("discriminator");
                match call.name() {
                    "has_value" => {
                        call.arity(1)?;
                        discriminator.has_value(call.value(0)?);
                    }
                    _ => return Err(call.unknown("a discriminator")),
                }
            }
            return Ok(());
        }
        "has_data" => {
            call.arity(0)?;
            let mut row = b.has_data();
            for call in rest {
                call.trace("seed row");
                match call.name() {
                    "value" => {
                        call.arity(2)?;
                        row.value(&call.string(0)?, call.value(1)?);
                    }
                    _ => return Err(call.unknown("a seed row")),
                }
            }
            return Ok(());
        }
        "has_discriminator_value" => {
            call.arity(1)?;
            b.has_discriminator_value(call.value(0)?);
        }
        "has_check_constraint" => {
            call.arity(2)?;
            b.has_check_constraint(&call.string(0)?, &call.string(1)?);
        }
        "has_trigger" => {
            call.arity(1)?;
            b.has_trigger(&call.string(0)?);
        }
        "has_comment" => {
            call.arity(1)?;
            b.has_comment(&call.string(0)?);
        }
        "has_annotation" => {
            call.arity(2)?;
            b.has_annotation(&call.string(0)?, call.value(1)?);
        }
        _ => return Err(call.unknown("an entity type")),
    }

    entity_chain(b, rest)
}

fn property_chain(p: &mut PropertyBuilder<'_>, calls: &[Call<'_>]) -> Result<()> {
    for call in calls {
        call.trace("property");
        match call.name() {
            "is_required" => {
                call.arity(0)?;
                p.is_required();
            }
            "is_nullable" => {
                call.arity(0)?;
                p.is_nullable();
            }
            "has_max_length" => {
                call.arity(1)?;
                p.has_max_length(call.integer(0)?);
            }
            "is_fixed_length" => {
                call.arity(0)?;
                p.is_fixed_length();
            }
            "has_precision" => {
                call.arity(1)?;
                p.has_precision(call.integer(0)?);
            }
            "has_scale" => {
                call.arity(1)?;
                p.has_scale(call.integer(0)?);
            }
            "is_concurrency_token" => {
                call.arity(0)?;
                p.is_concurrency_token();
            }
            "value_generated" => {
                call.arity(1)?;
                p.value_generated(call.variant(0, "ValueGenerated", ValueGenerated::from_name)?);
            }
            "has_default_value" => {
                call.arity(1)?;
                p.has_default_value(call.value(0)?);
            }
            "has_default_value_sql" => {
                call.arity(1)?;
                p.has_default_value_sql(&call.string(0)?);
            }
            "has_computed_column_sql" => {
                call.arity(2)?;
                p.has_computed_column_sql(&call.string(0)?, call.boolean(1)?);
            }
            "has_column_name" => {
                call.arity(1)?;
                p.has_column_name(&call.string(0)?);
            }
            "has_column_type" => {
                call.arity(1)?;
                p.has_column_type(&call.string(0)?);
            }
            "use_sequence" => {
                call.arity(2)?;
                p.use_sequence(&call.string(0)?, call.opt_string(1)?.as_deref());
            }
            "has_comment" => {
                call.arity(1)?;
                p.has_comment(&call.string(0)?);
            }
            "use_collation" => {
                call.arity(1)?;
                p.use_collation(&call.string(0)?);
            }
            "has_annotation" => {
                call.arity(2)?;
                p.has_annotation(&call.string(0)?, call.value(1)?);
            }
            _ => return Err(call.unknown("a property")),
        }
    }
    Ok(())
}

fn complex_chain(c: &mut ComplexPropertyBuilder<'_>, calls: &[Call<'_>]) -> Result<()> {
    let Some((call, rest)) = calls.split_first() else {
        return Ok(());
    };
    call.trace("complex property");

    match call.name() {
        "is_required" => {
            call.arity(0)?;
            c.is_required();
        }
        "property" => {
            call.arity(2)?;
            let ty = call.variant(1, "Type", Type::from_name)?;
            return property_chain(&mut c.property(&call.string(0)?, ty), rest);
        }
        "complex_property" => {
            call.arity(2)?;
            let name = call.string(0)?;
            let closure = call.closure(1)?;
            let mut result = Ok(());
            c.complex_property(&name, |nested| {
                result = closure.replay(|calls| complex_chain(nested, calls));
            });
            result?;
        }
        _ => return Err(call.unknown("a complex property")),
    }

    complex_chain(c, rest)
}

fn procedure_chain(p: &mut ProcedureBuilder<'_>, calls: &[Call<'_>]) -> Result<()> {
    let Some((call, rest)) = calls.split_first() else {
        return Ok(());
    };
    call.trace("stored procedure");

    match call.name() {
        "has_schema" => {
            call.arity(1)?;
            p.has_schema(&call.string(0)?);
        }
        "has_parameter" => {
            call.arity(1)?;
            let mut parameter = p.has_parameter(&call.string(0)?);
            for call in rest {
                call.trace("parameter");
                match call.name() {
                    "has_name" => {
                        call.arity(1)?;
                        parameter.has_name(&call.string(0)?);
                    }
                    "is_output" => {
                        call.arity(0)?;
                        parameter.is_output();
                    }
                    "is_input_output" => {
                        call.arity(0)?;
                        parameter.is_input_output();
                    }
                    "is_original_value" => {
                        call.arity(0)?;
                        parameter.is_original_value();
                    }
                    _ => return Err(call.unknown("a parameter")),
                }
            }
            return Ok(());
        }
        "has_result_column" => {
            call.arity(1)?;
            p.has_result_column(&call.string(0)?);
        }
        "has_definition" => {
            call.arity(1)?;
            p.has_definition(&call.string(0)?);
        }
        _ => return Err(call.unknown("a stored procedure")),
    }

    procedure_chain(p, rest)
}

fn fragment_chain(f: &mut FragmentBuilder<'_>, calls: &[Call<'_>]) -> Result<()> {
    let Some((call, rest)) = calls.split_first() else {
        return Ok(());
    };
    call.trace("split fragment");

    match call.name() {
        "has_schema" => {
            call.arity(1)?;
            f.has_schema(&call.string(0)?);
        }
        "property" => {
            call.arity(1)?;
            let mut property = f.property(&call.string(0)?);
            for call in rest {
                call.trace("fragment property");
                match call.name() {
                    "has_column_name" => {
                        call.arity(1)?;
                        property.has_column_name(&call.string(0)?);
                    }
                    _ => return Err(call.unknown("a fragment property")),
                }
            }
            return Ok(());
        }
        "exclude_from_migrations" => {
            call.arity(0)?;
            f.exclude_from_migrations();
        }
        "has_check_constraint" => {
            call.arity(2)?;
            f.has_check_constraint(&call.string(0)?, &call.string(1)?);
        }
        "has_trigger" => {
            call.arity(1)?;
            f.has_trigger(&call.string(0)?);
        }
        "has_comment" => {
            call.arity(1)?;
            f.has_comment(&call.string(0)?);
        }
        _ => return Err(call.unknown("a split fragment")),
    }

    fragment_chain(f, rest)
}

fn refs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}
