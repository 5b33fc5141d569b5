use super::Error;

/// Error when snapshot source text cannot be replayed.
#[derive(Debug)]
pub(super) struct InvalidSnapshot {
    message: Box<str>,
}

impl std::error::Error for InvalidSnapshot {}

impl core::fmt::Display for InvalidSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid snapshot: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid snapshot error.
    pub fn invalid_snapshot(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSnapshot(InvalidSnapshot {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid snapshot error.
    pub fn is_invalid_snapshot(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidSnapshot(_)))
    }
}
