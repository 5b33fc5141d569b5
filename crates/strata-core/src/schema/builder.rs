mod columns;
mod constraints;
mod data;
mod routines;
mod sequences;
mod table;
mod tpc;
mod tph;
mod tpt;

use super::{app, db, Diagnostic, Mapping, ObjectName, Schema};
use crate::schema::app::EntityTypeId;
use crate::schema::db::TableId;
use crate::schema::type_mapping::StorageTypes;
use crate::{Error, Result};

use columns::{Contribution, Placement};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Projects a finalized conceptual model onto a relational model.
///
/// The builder only holds options; building never mutates it, so one value
/// can project any number of models. Projection is deterministic: two
/// models that compare equal always project to equal schemas.
#[derive(Debug, Clone)]
pub struct Builder {
    /// Schema for store objects that do not name one, used when the model
    /// does not set its own default
    default_schema: Option<String>,

    /// Generated constraint and index names longer than this are truncated
    max_identifier_length: usize,

    /// Synthesize a shared key sequence for TPC hierarchies
    tpc_sequences: bool,

    storage_types: StorageTypes,
}

/// Used to track state during the build process
struct BuildSchema<'a> {
    /// Build options
    builder: &'a Builder,

    app: &'a app::Model,

    default_schema: Option<String>,

    /// Maps table names to identifiers.
    table_lookup: IndexMap<ObjectName, TableId>,

    /// Tables as they are built
    tables: Vec<db::Table>,

    views: Vec<db::View>,

    functions: Vec<db::Function>,

    procedures: Vec<db::StoredProcedure>,

    sequences: Vec<db::Sequence>,

    /// Main table of each entity type, `None` when unmapped
    targets: IndexMap<EntityTypeId, Option<TableId>>,

    /// How each table-mapped entity type lays out its main fragment. Owned
    /// types colocated with their owner derive theirs from the owner's.
    placements: IndexMap<EntityTypeId, (TableId, Placement)>,

    /// Column claims, one list per table, aggregated into columns once every
    /// entity type has been placed
    contributions: Vec<Vec<Contribution>>,

    /// Key sequence of each TPC root
    tpc_sequences: IndexMap<EntityTypeId, ObjectName>,

    /// App-level to db-level mapping
    mapping: Mapping,

    diagnostics: Vec<Diagnostic>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            default_schema: None,
            max_identifier_length: 128,
            tpc_sequences: true,
            storage_types: StorageTypes::DEFAULT,
        }
    }

    pub fn default_schema(&mut self, schema: &str) -> &mut Self {
        self.default_schema = Some(schema.to_string());
        self
    }

    pub fn max_identifier_length(&mut self, max: usize) -> &mut Self {
        self.max_identifier_length = max;
        self
    }

    pub fn tpc_sequences(&mut self, enabled: bool) -> &mut Self {
        self.tpc_sequences = enabled;
        self
    }

    pub fn storage_types(&mut self, storage_types: StorageTypes) -> &mut Self {
        self.storage_types = storage_types;
        self
    }

    /// The schema used for store objects that do not name one.
    pub fn schema_default(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    pub fn identifier_limit(&self) -> usize {
        self.max_identifier_length
    }

    pub fn has_tpc_sequences(&self) -> bool {
        self.tpc_sequences
    }

    pub fn build(&self, app: app::Model) -> Result<Schema> {
        let (db, mapping, diagnostics) = {
            let mut cx = BuildSchema::new(self, &app);

            cx.build_sequences()?;

            // Decide where every entity type lives before laying out any
            // column, so owned and derived types can find their targets.
            cx.build_table_stubs()?;
            cx.verify_table_sharing()?;

            cx.build_columns()?;
            cx.build_primary_keys();
            cx.build_unique_constraints()?;
            cx.build_indices()?;
            cx.build_foreign_keys()?;
            cx.build_data()?;
            cx.build_table_facets();
            cx.build_routines()?;

            cx.finish()
        };

        let schema = Schema {
            app,
            db: Arc::new(db),
            mapping,
            diagnostics,
            builder: self.clone(),
        };

        // Verify the schema structure
        schema.verify()?;

        Ok(schema)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> BuildSchema<'a> {
    fn new(builder: &'a Builder, app: &'a app::Model) -> Self {
        Self {
            builder,
            app,
            default_schema: app
                .default_schema
                .clone()
                .or_else(|| builder.default_schema.clone()),
            table_lookup: IndexMap::new(),
            tables: vec![],
            views: vec![],
            functions: vec![],
            procedures: vec![],
            sequences: vec![],
            targets: IndexMap::new(),
            placements: IndexMap::new(),
            contributions: vec![],
            tpc_sequences: IndexMap::new(),
            mapping: Mapping::default(),
            diagnostics: vec![],
        }
    }

    fn finish(self) -> (db::Schema, Mapping, Vec<Diagnostic>) {
        debug!(
            tables = self.tables.len(),
            views = self.views.len(),
            sequences = self.sequences.len(),
            "projection complete"
        );

        let db = db::Schema {
            default_schema: self.default_schema,
            tables: self.tables,
            views: self.views,
            functions: self.functions,
            procedures: self.procedures,
            sequences: self.sequences,
            annotations: self.app.annotations.clone(),
        };
        (db, self.mapping, self.diagnostics)
    }

    /// Fills in the default schema.
    fn qualify(&self, name: &ObjectName) -> ObjectName {
        name.or_schema(self.default_schema.as_deref())
    }

    /// Applies the identifier length limit to a generated name.
    fn identifier(&mut self, name: String) -> String {
        let shortened = shorten(&name, self.builder.max_identifier_length, 0);
        self.note_renamed(&name, &shortened);
        shortened
    }

    /// Names a new constraint of `kind` in `table`. `existing` pairs every
    /// name of that kind already in the table with whether its constraint
    /// equals the new one. Returns `None` when an equal constraint exists.
    ///
    /// Generated names that collide after truncation are numbered; a
    /// declared name may only be reused by an equal constraint.
    fn constraint_name(
        &mut self,
        kind: &str,
        table: TableId,
        declared: Option<String>,
        generated: String,
        existing: &[(String, bool)],
    ) -> Result<Option<String>> {
        let lookup = |name: &str| existing.iter().find(|(n, _)| n == name).map(|(_, same)| *same);

        if let Some(name) = declared {
            return match lookup(&name) {
                None => Ok(Some(name)),
                Some(true) => Ok(None),
                Some(false) => Err(Error::invalid_schema(format!(
                    "{kind} `{name}` on table `{}` is declared for two different definitions",
                    self.tables[table.0].name
                ))),
            };
        }

        let max = self.builder.max_identifier_length;
        let mut uniquifier = 0;
        loop {
            let name = shorten(&generated, max, uniquifier);
            match lookup(&name) {
                None => {
                    self.note_renamed(&generated, &name);
                    return Ok(Some(name));
                }
                Some(true) => return Ok(None),
                Some(false) => uniquifier += 1,
            }
        }
    }

    fn note_renamed(&mut self, name: &str, shortened: &str) {
        if name == shortened {
            return;
        }
        info!(name = %name, truncated = %shortened, "truncating identifier");
        self.diagnostics.push(Diagnostic::info(
            name,
            format!(
                "identifier exceeds {} characters or collides; named `{shortened}`",
                self.builder.max_identifier_length
            ),
        ));
    }
}

/// Fits `name` followed by `uniquifier` (when non-zero) into `max`
/// characters, marking a cut with `~`.
fn shorten(name: &str, max: usize, uniquifier: usize) -> String {
    let suffix = match uniquifier {
        0 => String::new(),
        n => n.to_string(),
    };
    let room = max.saturating_sub(suffix.len());

    let mut shortened: String = if name.chars().count() <= room {
        name.to_string()
    } else {
        let mut cut: String = name.chars().take(room.saturating_sub(1)).collect();
        cut.push('~');
        cut
    };
    shortened.push_str(&suffix);
    shortened
}

#[cfg(test)]
mod tests {
    use super::shorten;

    #[test]
    fn short_names_are_kept() {
        assert_eq!(shorten("PK_Blog", 128, 0), "PK_Blog");
        assert_eq!(shorten("PK_Blog", 7, 0), "PK_Blog");
    }

    #[test]
    fn long_names_are_cut_with_a_marker() {
        assert_eq!(shorten("IX_Orders_CustomerId", 10, 0), "IX_Orders~");
        assert_eq!(shorten("IX_Orders_CustomerId", 10, 0).chars().count(), 10);
    }

    #[test]
    fn numbered_names_still_fit() {
        assert_eq!(shorten("IX_Orders_CustomerId", 10, 1), "IX_Order~1");
        assert_eq!(shorten("IX_Orders_CustomerId", 10, 12), "IX_Orde~12");
        assert_eq!(shorten("IX_Orders", 128, 2), "IX_Orders2");
    }
}
