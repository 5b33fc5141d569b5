use super::Error;

/// Error when a conceptual model cannot be finalized or projected.
///
/// This occurs when:
/// - A mapping target cannot be resolved (unknown entity type, property or
///   store object)
/// - A derived type declares a mapping strategy different from its root
/// - A table-mapped entity type has no key
/// - Discriminator values are missing or ambiguous
/// - A split fragment or override is inconsistent with the entity's mapping
///
/// These errors are raised before any diff or snapshot generation runs.
#[derive(Debug)]
pub(super) struct InvalidSchema {
    message: Box<str>,
}

impl std::error::Error for InvalidSchema {}

impl core::fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchema {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is an invalid
    /// schema error.
    pub fn is_invalid_schema(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidSchema(_)))
    }
}
