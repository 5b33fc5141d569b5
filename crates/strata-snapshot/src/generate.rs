use crate::literal::{bools, opt_string, string, strings, value};

use strata_core::schema::app::{
    ComplexProperty, EntityType, ForeignKey, Key, Model, ParameterDirection, ProcedureKind,
    Property, PropertyId, ReferentialAction, Sequence, SequenceCache, StoreObjectKind,
    TableMapping, Type,
};
use strata_core::schema::{Annotations, Builder, DefaultValue, Schema};
use strata_core::{bail, Result};

use tracing::debug;

/// Writes a model as a snapshot: a builder program which, replayed by
/// [`read`](crate::read), reconstructs the same model.
#[derive(Debug, Clone)]
pub struct Generator {
    /// Module wrapping the snapshot
    namespace: String,

    class_name: String,

    /// Written instead of the model's own product version when set
    product_version: Option<String>,
}

impl Generator {
    /// `namespace` is a hint: it is turned into a valid module name.
    pub fn new(namespace: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            class_name: class_name.into(),
            product_version: None,
        }
    }

    /// Version of the tool writing the snapshot.
    pub fn product_version(&mut self, version: &str) -> &mut Self {
        self.product_version = Some(version.to_string());
        self
    }

    /// Generates the snapshot of `schema`'s conceptual model.
    ///
    /// Fails without producing text when a value has no literal form.
    pub fn generate(&self, schema: &Schema) -> Result<String> {
        let model = &schema.app;
        let mut generate = Generate {
            model,
            out: Writer::default(),
        };

        let product_version = self
            .product_version
            .as_deref()
            .or(model.product_version.as_deref());

        generate.out.line("// <auto-generated />");
        generate
            .out
            .open(format!("mod {} {{", module_name(&self.namespace)));
        generate.out.line("use strata_core::schema::app::*;");
        generate.out.line("#[allow(unused_imports)]");
        generate.out.line("use strata_core::schema::{Builder, Value};");
        generate.out.line("use strata_snapshot::ModelSnapshot;");
        generate.out.blank();
        generate
            .out
            .line(format!("pub struct {};", type_name(&self.class_name)));
        generate.out.blank();
        generate.out.open(format!(
            "impl ModelSnapshot for {} {{",
            type_name(&self.class_name)
        ));
        generate.configure(&schema.builder);
        generate
            .out
            .open("fn build_model(model: &mut ModelBuilder) {");
        generate.build_model(product_version)?;
        generate.out.close("}");
        generate.out.close("}");
        generate.out.close("}");

        debug!(
            entity_types = model.entity_types.len(),
            bytes = generate.out.text.len(),
            "generated snapshot"
        );

        Ok(generate.out.text)
    }
}

struct Generate<'a> {
    model: &'a Model,
    out: Writer,
}

impl Generate<'_> {
    /// Projection options that differ from the defaults, so reading the
    /// snapshot projects the same relational model.
    fn configure(&mut self, builder: &Builder) {
        let defaults = Builder::new();
        let mut calls = vec![];
        if let Some(schema) = builder.schema_default() {
            calls.push(format!("builder.default_schema({});", string(schema)));
        }
        if builder.identifier_limit() != defaults.identifier_limit() {
            calls.push(format!("builder.max_identifier_length({});", builder.identifier_limit()));
        }
        if builder.has_tpc_sequences() != defaults.has_tpc_sequences() {
            calls.push(format!("builder.tpc_sequences({});", builder.has_tpc_sequences()));
        }
        if calls.is_empty() {
            return;
        }

        self.out.open("fn configure(builder: &mut Builder) {");
        for call in calls {
            self.out.line(call);
        }
        self.out.close("}");
        self.out.blank();
    }

    fn build_model(&mut self, product_version: Option<&str>) -> Result<()> {
        let model = self.model;

        if let Some(version) = product_version {
            self.out
                .line(format!("model.product_version({});", string(version)));
        }
        if let Some(schema) = &model.default_schema {
            self.out
                .line(format!("model.has_default_schema({});", string(schema)));
        }
        for (key, annotation) in model.annotations.iter() {
            let annotation = value(key, annotation)?;
            self.out.line(format!(
                "model.has_annotation({}, {annotation});",
                string(key)
            ));
        }

        for sequence in &model.sequences {
            self.sequence(sequence)?;
        }

        for id in model.canonical_order() {
            let entity = model.entity_type(id);
            if entity.is_owned() {
                continue;
            }
            self.out.blank();
            self.out
                .open(format!("model.entity({}, |b| {{", string(&entity.name)));
            self.entity_type(entity, "b", 0)?;
            self.out.close("});");
        }

        for id in model.canonical_order() {
            self.relationships(model.entity_type(id))?;
        }

        Ok(())
    }

    fn sequence(&mut self, sequence: &Sequence) -> Result<()> {
        let mut chain = vec![];
        if sequence.ty != Type::I64 {
            chain.push(format!("has_type(Type::{})", sequence.ty.name()));
        }
        if sequence.start != 1 {
            chain.push(format!("starts_at({})", sequence.start));
        }
        if sequence.increment != 1 {
            chain.push(format!("increments_by({})", sequence.increment));
        }
        if let Some(min) = sequence.min {
            chain.push(format!("has_min({min})"));
        }
        if let Some(max) = sequence.max {
            chain.push(format!("has_max({max})"));
        }
        if sequence.cyclic {
            chain.push("is_cyclic()".to_string());
        }
        match sequence.cache {
            SequenceCache::Default => {}
            SequenceCache::NoCache => chain.push("use_no_cache()".to_string()),
            SequenceCache::Size(size) => chain.push(format!("use_cache({size})")),
        }
        annotations(&mut chain, &sequence.name.to_string(), &sequence.annotations)?;

        self.out.statement(
            format!(
                "model.has_sequence({}, {})",
                string(&sequence.name.name),
                opt_string(sequence.name.schema.as_deref())
            ),
            chain,
        );
        Ok(())
    }

    /// Body of an entity type block: everything but relationships, which
    /// are written once every type exists.
    fn entity_type(&mut self, entity: &EntityType, b: &str, depth: usize) -> Result<()> {
        let model = self.model;

        if let Some(base) = entity.base {
            self.out.line(format!(
                "{b}.has_base_type({});",
                string(&model.entity_type(base).name)
            ));
        }
        if entity.is_abstract {
            self.out.line(format!("{b}.is_abstract();"));
        }
        if let Some(strategy) = entity.strategy {
            self.out.line(format!(
                "{b}.use_mapping_strategy(MappingStrategy::{});",
                strategy.name()
            ));
        }

        for property in &entity.properties {
            self.property(&entity.name, b, property)?;
        }
        for complex in &entity.complex_properties {
            self.complex_property(&entity.name, b, complex, 0)?;
        }

        if let Some(key) = &entity.primary_key {
            self.key(&entity.name, b, "has_key", key)?;
        }
        if entity.keyless {
            self.out.line(format!("{b}.has_no_key();"));
        }
        for key in &entity.alternate_keys {
            self.key(&entity.name, b, "has_alternate_key", key)?;
        }

        for index in &entity.indexes {
            let mut chain = vec![];
            if index.unique {
                chain.push("is_unique()".to_string());
            }
            if let Some(name) = &index.name {
                chain.push(format!("has_name({})", string(name)));
            }
            if let Some(filter) = &index.filter {
                chain.push(format!("has_filter({})", string(filter)));
            }
            if !index.descending.is_empty() {
                chain.push(format!("is_descending({})", bools(&index.descending)));
            }
            annotations(&mut chain, &entity.name, &index.annotations)?;
            self.out.statement(
                format!("{b}.has_index({})", self.property_names(&index.properties)),
                chain,
            );
        }

        self.store_mappings(entity, b);

        if let Some(discriminator) = entity.discriminator {
            self.out.line(format!(
                "{b}.has_discriminator({});",
                string(&model.property(discriminator).name)
            ));
        }
        if let Some(discriminator_value) = &entity.discriminator_value {
            let literal = value(&format!("{} discriminator", entity.name), discriminator_value)?;
            self.out
                .line(format!("{b}.has_discriminator_value({literal});"));
        }

        for check in &entity.check_constraints {
            self.out.line(format!(
                "{b}.has_check_constraint({}, {});",
                string(&check.name),
                string(&check.sql)
            ));
        }
        for trigger in &entity.triggers {
            self.out
                .line(format!("{b}.has_trigger({});", string(&trigger.name)));
        }
        if let Some(comment) = &entity.comment {
            self.out
                .line(format!("{b}.has_comment({});", string(comment)));
        }
        for (key, annotation) in entity.annotations.iter() {
            let annotation = value(&entity.name, annotation)?;
            self.out
                .line(format!("{b}.has_annotation({}, {annotation});", string(key)));
        }
        for row in &entity.data {
            let chain = row
                .values
                .iter()
                .map(|(property, seed)| {
                    let name = &model.property(*property).name;
                    let literal = value(&format!("{}.{name} seed value", entity.name), seed)?;
                    Ok(format!("value({}, {literal})", string(name)))
                })
                .collect::<Result<Vec<_>>>()?;
            self.out.statement(format!("{b}.has_data()"), chain);
        }

        for owned in model.owned_by(entity.id) {
            let Some(ownership) = &owned.ownership else {
                continue;
            };
            let nested = format!("b{}", depth + 1);
            let method = if ownership.collection {
                "owns_many"
            } else {
                "owns_one"
            };

            self.out.blank();
            self.out.open(format!(
                "{b}.{method}({}, |{nested}| {{",
                string(&ownership.navigation)
            ));
            if ownership.required {
                self.out.line(format!("{nested}.is_required();"));
            }
            if ownership.json {
                let mut chain = vec![];
                if let Some(column) = &ownership.json_column {
                    chain.push(format!("has_column_name({})", string(column)));
                }
                self.out.statement(format!("{nested}.to_json()"), chain);
            }
            self.entity_type(owned, &nested, depth + 1)?;
            self.out.close("});");
        }

        Ok(())
    }

    fn property(&mut self, owner: &str, b: &str, property: &Property) -> Result<()> {
        let owner = format!("{owner}.{}", property.name);
        let mut chain = vec![];

        if property.nullable != Property::default_nullable(property.ty) {
            chain.push(if property.nullable {
                "is_nullable()".to_string()
            } else {
                "is_required()".to_string()
            });
        }
        if property.value_generated_explicit {
            chain.push(format!(
                "value_generated(ValueGenerated::{})",
                property.value_generated.name()
            ));
        }
        if let Some(max_length) = property.max_length {
            chain.push(format!("has_max_length({max_length})"));
        }
        if property.fixed_length {
            chain.push("is_fixed_length()".to_string());
        }
        if let Some(precision) = property.precision {
            chain.push(format!("has_precision({precision})"));
        }
        if let Some(scale) = property.scale {
            chain.push(format!("has_scale({scale})"));
        }
        if property.concurrency_token {
            chain.push("is_concurrency_token()".to_string());
        }
        match &property.default {
            Some(DefaultValue::Value(default)) => {
                chain.push(format!("has_default_value({})", value(&owner, default)?))
            }
            Some(DefaultValue::Sql(sql)) => {
                chain.push(format!("has_default_value_sql({})", string(sql)))
            }
            None => {}
        }
        if let Some(computed) = &property.computed {
            chain.push(format!(
                "has_computed_column_sql({}, {})",
                string(&computed.sql),
                computed.stored
            ));
        }
        if let Some(column_name) = &property.column_name {
            chain.push(format!("has_column_name({})", string(column_name)));
        }
        if let Some(column_type) = &property.column_type {
            chain.push(format!("has_column_type({})", string(column_type)));
        }
        if let Some(sequence) = &property.sequence {
            chain.push(format!(
                "use_sequence({}, {})",
                string(&sequence.name),
                opt_string(sequence.schema.as_deref())
            ));
        }
        if let Some(comment) = &property.comment {
            chain.push(format!("has_comment({})", string(comment)));
        }
        if let Some(collation) = &property.collation {
            chain.push(format!("use_collation({})", string(collation)));
        }
        annotations(&mut chain, &owner, &property.annotations)?;

        self.out.statement(
            format!(
                "{b}.property({}, Type::{})",
                string(&property.name),
                property.ty.name()
            ),
            chain,
        );
        Ok(())
    }

    fn complex_property(
        &mut self,
        owner: &str,
        b: &str,
        complex: &ComplexProperty,
        depth: usize,
    ) -> Result<()> {
        let owner = format!("{owner}.{}", complex.name);
        let c = match depth {
            0 => "c".to_string(),
            depth => format!("c{depth}"),
        };

        self.out.open(format!(
            "{b}.complex_property({}, |{c}| {{",
            string(&complex.name)
        ));
        if complex.required {
            self.out.line(format!("{c}.is_required();"));
        }
        for property in &complex.properties {
            self.property(&owner, &c, property)?;
        }
        for nested in &complex.complex_properties {
            self.complex_property(&owner, &c, nested, depth + 1)?;
        }
        self.out.close("});");
        Ok(())
    }

    fn key(&mut self, owner: &str, b: &str, method: &str, key: &Key) -> Result<()> {
        let mut chain = vec![];
        if let Some(name) = &key.name {
            chain.push(format!("has_name({})", string(name)));
        }
        annotations(&mut chain, owner, &key.annotations)?;
        self.out.statement(
            format!("{b}.{method}({})", self.property_names(&key.properties)),
            chain,
        );
        Ok(())
    }

    fn store_mappings(&mut self, entity: &EntityType, b: &str) {
        let model = self.model;

        match &entity.table {
            TableMapping::Default => {}
            TableMapping::Table(name) => {
                let mut chain = vec![];
                if let Some(schema) = &name.schema {
                    chain.push(format!("has_schema({})", string(schema)));
                }
                if entity.excluded_from_migrations {
                    chain.push("exclude_from_migrations()".to_string());
                }
                self.out
                    .statement(format!("{b}.to_table({})", string(&name.name)), chain);
            }
            TableMapping::None => self.out.line(format!("{b}.has_no_table();")),
        }

        if let Some(view) = &entity.view {
            let mut chain = vec![];
            if let Some(schema) = &view.name.schema {
                chain.push(format!("has_schema({})", string(schema)));
            }
            if let Some(definition) = &view.definition {
                chain.push(format!("has_definition({})", string(definition)));
            }
            self.out
                .statement(format!("{b}.to_view({})", string(&view.name.name)), chain);
        }

        if let Some(function) = &entity.function {
            let mut chain = vec![];
            if let Some(schema) = &function.name.schema {
                chain.push(format!("has_schema({})", string(schema)));
            }
            if let Some(definition) = &function.definition {
                chain.push(format!("has_definition({})", string(definition)));
            }
            self.out.statement(
                format!("{b}.to_function({})", string(&function.name.name)),
                chain,
            );
        }

        for procedure in &entity.procedures {
            let method = match procedure.kind {
                ProcedureKind::Insert => "insert_using_stored_procedure",
                ProcedureKind::Update => "update_using_stored_procedure",
                ProcedureKind::Delete => "delete_using_stored_procedure",
            };
            self.out.open(format!(
                "{b}.{method}({}, |p| {{",
                string(&procedure.name.name)
            ));
            if let Some(schema) = &procedure.name.schema {
                self.out.line(format!("p.has_schema({});", string(schema)));
            }
            for parameter in &procedure.parameters {
                let mut chain = vec![];
                if let Some(name) = &parameter.name {
                    chain.push(format!("has_name({})", string(name)));
                }
                match parameter.direction {
                    ParameterDirection::Input => {}
                    ParameterDirection::Output => chain.push("is_output()".to_string()),
                    ParameterDirection::InputOutput => {
                        chain.push("is_input_output()".to_string())
                    }
                }
                if parameter.original_value {
                    chain.push("is_original_value()".to_string());
                }
                self.out.statement(
                    format!(
                        "p.has_parameter({})",
                        string(&model.property(parameter.property).name)
                    ),
                    chain,
                );
            }
            for column in &procedure.result_columns {
                self.out.line(format!(
                    "p.has_result_column({});",
                    string(&model.property(*column).name)
                ));
            }
            if let Some(definition) = &procedure.definition {
                self.out
                    .line(format!("p.has_definition({});", string(definition)));
            }
            self.out.close("});");
        }

        for fragment in &entity.fragments {
            let method = match fragment.kind {
                StoreObjectKind::View => "split_to_view",
                _ => "split_to_table",
            };
            self.out.open(format!(
                "{b}.{method}({}, |f| {{",
                string(&fragment.name.name)
            ));
            if let Some(schema) = &fragment.name.schema {
                self.out.line(format!("f.has_schema({});", string(schema)));
            }
            for id in &fragment.properties {
                let property = model.property(*id);
                let mut chain = vec![];
                let column = property
                    .overrides
                    .iter()
                    .find(|o| o.store == fragment.name);
                if let Some(column) = column {
                    chain.push(format!("has_column_name({})", string(&column.column_name)));
                }
                self.out
                    .statement(format!("f.property({})", string(&property.name)), chain);
            }
            if fragment.excluded_from_migrations {
                self.out.line("f.exclude_from_migrations();");
            }
            for check in &fragment.check_constraints {
                self.out.line(format!(
                    "f.has_check_constraint({}, {});",
                    string(&check.name),
                    string(&check.sql)
                ));
            }
            for trigger in &fragment.triggers {
                self.out
                    .line(format!("f.has_trigger({});", string(&trigger.name)));
            }
            if let Some(comment) = &fragment.comment {
                self.out
                    .line(format!("f.has_comment({});", string(comment)));
            }
            self.out.close("});");
        }
    }

    /// Relationship pass for one entity type. Ownership relationships are
    /// implied by the nested blocks.
    fn relationships(&mut self, entity: &EntityType) -> Result<()> {
        let foreign_keys: Vec<_> = entity
            .foreign_keys
            .iter()
            .filter(|fk| !fk.is_ownership)
            .collect();
        if foreign_keys.is_empty() && entity.skip_navigations.is_empty() {
            return Ok(());
        }

        self.out.blank();
        self.out
            .open(format!("model.entity({}, |b| {{", string(&entity.name)));
        for fk in foreign_keys {
            self.foreign_key(entity, fk)?;
        }
        for skip in &entity.skip_navigations {
            let mut chain = vec![];
            if let Some(inverse) = &skip.inverse {
                chain.push(format!("with_many({})", string(inverse)));
            }
            chain.push(format!(
                "using_entity({})",
                string(&self.model.entity_type(skip.join_entity).name)
            ));
            self.out.statement(
                format!(
                    "b.has_many({}, {})",
                    string(&self.model.entity_type(skip.target).name),
                    string(&skip.name)
                ),
                chain,
            );
        }
        self.out.close("});");
        Ok(())
    }

    fn foreign_key(&mut self, entity: &EntityType, fk: &ForeignKey) -> Result<()> {
        let model = self.model;
        let mut chain = vec![];

        if fk.unique {
            chain.push(format!("with_one({})", opt_string(fk.inverse.as_deref())));
        } else if let Some(inverse) = &fk.inverse {
            chain.push(format!("with_many(Some({}))", string(inverse)));
        }

        chain.push(format!(
            "has_foreign_key({})",
            self.property_names(&fk.properties)
        ));

        let primary_key = model.primary_key_of(fk.principal).map(|key| &key.properties);
        if primary_key != Some(&fk.principal_key) {
            if fk.principal_key.is_empty() {
                bail!(
                    "relationship from `{}` to `{}` has no principal key",
                    entity.name,
                    model.entity_type(fk.principal).name
                );
            }
            chain.push(format!(
                "has_principal_key({})",
                self.property_names(&fk.principal_key)
            ));
        }

        if fk.required {
            chain.push("is_required()".to_string());
        }

        let on_delete = if fk.required {
            ReferentialAction::Cascade
        } else {
            ReferentialAction::NoAction
        };
        if fk.on_delete != on_delete {
            chain.push(format!(
                "on_delete(ReferentialAction::{})",
                fk.on_delete.name()
            ));
        }

        if let Some(name) = &fk.name {
            chain.push(format!("has_constraint_name({})", string(name)));
        }
        annotations(&mut chain, &entity.name, &fk.annotations)?;

        self.out.statement(
            format!(
                "b.has_one({}, {})",
                string(&model.entity_type(fk.principal).name),
                opt_string(fk.navigation.as_deref())
            ),
            chain,
        );
        Ok(())
    }

    fn property_names(&self, properties: &[PropertyId]) -> String {
        strings(
            properties
                .iter()
                .map(|id| self.model.property(*id).name.as_str()),
        )
    }
}

fn annotations(chain: &mut Vec<String>, owner: &str, annotations: &Annotations) -> Result<()> {
    for (key, annotation) in annotations.iter() {
        chain.push(format!(
            "has_annotation({}, {})",
            string(key),
            value(&format!("{owner} annotation `{key}`"), annotation)?
        ));
    }
    Ok(())
}

/// `Blogging.Migrations` becomes `blogging_migrations`.
fn module_name(namespace: &str) -> String {
    let name = identifier(namespace).to_ascii_lowercase();
    if name.is_empty() {
        "snapshot".to_string()
    } else {
        name
    }
}

fn type_name(class_name: &str) -> String {
    let name = identifier(class_name);
    if name.is_empty() {
        "ModelSnapshot".to_string()
    } else {
        name
    }
}

fn identifier(text: &str) -> String {
    let mut out: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Indented source text.
#[derive(Debug, Default)]
struct Writer {
    text: String,
    indent: usize,
}

impl Writer {
    fn line(&mut self, line: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.text.push_str("    ");
        }
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn open(&mut self, line: impl AsRef<str>) {
        self.line(line);
        self.indent += 1;
    }

    fn close(&mut self, line: impl AsRef<str>) {
        self.indent -= 1;
        self.line(line);
    }

    /// `head` followed by one chained call per line.
    fn statement(&mut self, head: String, chain: Vec<String>) {
        if chain.is_empty() {
            self.line(format!("{head};"));
            return;
        }

        self.line(head);
        self.indent += 1;
        let last = chain.len() - 1;
        for (i, call) in chain.into_iter().enumerate() {
            let end = if i == last { ";" } else { "" };
            self.line(format!(".{call}{end}"));
        }
        self.indent -= 1;
    }
}
