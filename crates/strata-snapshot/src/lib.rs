mod generate;
pub use generate::Generator;

mod literal;

mod read;
pub use read::{read, read_model, read_with};

pub use strata_core::{Error, Result};

use strata_core::schema::app::{Model, ModelBuilder};
use strata_core::schema::{Builder, Schema};

/// A model compiled into the program as a generated snapshot.
///
/// Snapshots written by [`Generator`] implement this trait, so the same
/// text can be compiled in or replayed at runtime with [`read`].
pub trait ModelSnapshot {
    /// Projection options the snapshot was generated with.
    fn configure(_builder: &mut Builder) {}

    fn build_model(model: &mut ModelBuilder);

    /// Builds and finalizes the snapshot's model.
    fn model() -> Result<Model> {
        let mut model = ModelBuilder::new();
        Self::build_model(&mut model);
        model.finalize()
    }

    /// Builds the snapshot's model and projects it with its options.
    fn schema() -> Result<Schema> {
        let mut builder = Builder::new();
        Self::configure(&mut builder);
        builder.build(Self::model()?)
    }
}
