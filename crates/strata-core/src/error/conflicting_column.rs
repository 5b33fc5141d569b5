use super::Error;

/// Error when two property mappings contribute incompatible facets to the
/// same column.
///
/// Raised by column aggregation for TPH siblings, table splitting and
/// shared tables. The projection never picks one contribution over the
/// other.
#[derive(Debug)]
pub(super) struct ConflictingColumn {
    table: Box<str>,
    column: Box<str>,
    first: Box<str>,
    second: Box<str>,
    facet: &'static str,
}

impl std::error::Error for ConflictingColumn {}

impl core::fmt::Display for ConflictingColumn {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "conflicting column: `{}` and `{}` are both mapped to column `{}` in `{}` but \
             configured with a different {}",
            self.first, self.second, self.column, self.table, self.facet
        )
    }
}

impl Error {
    /// Creates a conflicting column error.
    ///
    /// `first` and `second` name the contributing properties
    /// (`Entity.Property`), `facet` the disagreeing part of the column
    /// definition (`type`, `default value`, `computed SQL`, ...).
    pub fn conflicting_column(
        table: impl Into<String>,
        column: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        facet: &'static str,
    ) -> Error {
        Error::from(super::ErrorKind::ConflictingColumn(ConflictingColumn {
            table: table.into().into(),
            column: column.into().into(),
            first: first.into().into(),
            second: second.into().into(),
            facet,
        }))
    }

    /// Returns `true` if this error is a conflicting column error.
    pub fn is_conflicting_column(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::ConflictingColumn(_)))
    }
}
