use thiserror::Error;

/// Top-level error type for the StudyBuddy pipeline.
#[derive(Debug, Error)]
pub enum StudyError {
    /// The chat endpoint answered with a non-success status.
    #[error("{message}")]
    Endpoint { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("document error: {0}")]
    Dom(String),
}

impl StudyError {
    /// Status code of a rejected endpoint call, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            StudyError::Endpoint { status, .. } => Some(*status),
            _ => None,
        }
    }
}
