//! Error type for format parsing and writing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    /// Song text that cannot be turned back into a valid song
    #[error("malformed song text at {field}: {reason}")]
    MalformedSerialization { field: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl ToString) -> Self {
        FormatError::MalformedSerialization { field: field.into(), reason: reason.to_string() }
    }
}
