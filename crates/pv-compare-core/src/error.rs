use thiserror::Error;

#[derive(Debug, Error)]
pub enum PvCompareError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PvCompareError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PvCompareError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PvCompareError {
    fn from(e: serde_json::Error) -> Self {
        PvCompareError::SerializationError(e.to_string())
    }
}
