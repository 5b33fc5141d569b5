use super::Error;

/// Error when a model value cannot be written as a literal in a snapshot.
///
/// Examples are non-finite floating point defaults and opaque runtime
/// objects. Generation stops before any text is produced.
#[derive(Debug)]
pub(super) struct UnsupportedLiteral {
    owner: Box<str>,
    value: Box<str>,
}

impl std::error::Error for UnsupportedLiteral {}

impl core::fmt::Display for UnsupportedLiteral {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unsupported literal: value of `{}` ({}) cannot be expressed in a snapshot",
            self.owner, self.value
        )
    }
}

impl Error {
    /// Creates an unsupported literal error for the value owned by `owner`.
    pub fn unsupported_literal(owner: impl Into<String>, value: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedLiteral(UnsupportedLiteral {
            owner: owner.into().into(),
            value: value.into().into(),
        }))
    }

    /// Returns `true` if this error is an unsupported literal error.
    pub fn is_unsupported_literal(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::UnsupportedLiteral(_)))
    }
}
