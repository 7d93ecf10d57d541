//! Error types for the Aden core library.

/// Top-level error enum for the Aden core library.
///
/// Only configuration problems are fatal. Input-resolution anomalies are
/// reported as warnings alongside results instead.
#[derive(Debug, thiserror::Error)]
pub enum AdenError {
    #[error("Unknown profile '{name}'. Valid profiles: {}", valid.join(", "))]
    UnknownProfile { name: String, valid: Vec<String> },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdenError {
    /// True for errors that abort a run before any scoring happens.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, AdenError::UnknownProfile { .. })
    }
}

pub type AdenResult<T> = Result<T, AdenError>;
