use super::{tpc, BuildSchema};
use crate::schema::app::{self, MappingStrategy, SequenceCache};
use crate::schema::db::{self, Facets, SequenceId};
use crate::schema::{Annotations, ObjectName};
use crate::{Error, Result};

use tracing::debug;

impl BuildSchema<'_> {
    /// Declared sequences, followed by the key sequences of TPC hierarchies.
    pub(super) fn build_sequences(&mut self) -> Result<()> {
        let app = self.app;

        for sequence in &app.sequences {
            let name = self.qualify(&sequence.name);
            let ty = self.sequence_type(sequence.ty, &name)?;
            self.sequences.push(db::Sequence {
                id: SequenceId(self.sequences.len()),
                name,
                ty,
                start: sequence.start,
                increment: sequence.increment,
                min: sequence.min,
                max: sequence.max,
                cyclic: sequence.cyclic,
                cache: sequence.cache,
                annotations: sequence.annotations.clone(),
            });
        }

        if !self.builder.tpc_sequences {
            return Ok(());
        }

        for id in app.canonical_order() {
            let root = app.entity_type(id);
            if root.base.is_some() || root.is_owned() || app.strategy_of(id) != MappingStrategy::Tpc {
                continue;
            }

            let Some(key) = tpc::sequence_key(app, root) else {
                continue;
            };

            let name = self.qualify(&ObjectName::new(format!("{}Sequence", root.short_name())));
            if !self.sequences.iter().any(|s| s.name == name) {
                debug!(sequence = %name, root = %root.name, "synthesizing TPC key sequence");
                let ty = self.sequence_type(key.ty, &name)?;
                self.sequences.push(db::Sequence {
                    id: SequenceId(self.sequences.len()),
                    name: name.clone(),
                    ty,
                    start: 1,
                    increment: 1,
                    min: None,
                    max: None,
                    cyclic: false,
                    cache: SequenceCache::Default,
                    annotations: Annotations::new(),
                });
            }
            self.tpc_sequences.insert(root.id, name);
        }

        Ok(())
    }

    fn sequence_type(&self, ty: app::Type, name: &ObjectName) -> Result<db::Type> {
        if !ty.is_integer() {
            return Err(Error::invalid_schema(format!(
                "sequence `{name}` must have an integer type, not {ty}"
            )));
        }
        db::Type::from_app(ty, None, &Facets::default(), &self.builder.storage_types)
    }
}
