use thiserror::Error;

/// Failures surfaced to the user as a one-line message and a non-zero exit.
#[derive(Debug, Error)]
pub enum JutError {
    /// The path or URL could not be read.
    #[error("cannot read {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// The bytes were read but do not form a notebook we understand.
    #[error("not a valid notebook: {0}")]
    MalformedDocument(String),

    /// The range options were rejected before selection.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

impl JutError {
    pub fn source_unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}
