use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataValidationError {
    #[error("data validation: key '{key}' is not valid JSON: {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("data validation: {}", reasons.join("; "))]
    Schema { reasons: Vec<String> },

    #[error("data validation: failed to encode record: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl DataValidationError {
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reasons: vec![reason.into()],
        }
    }

    /// Stable kind shared by all variants, matched on by callers that only
    /// need to know the data was unusable.
    pub fn kind(&self) -> &'static str {
        "data validation"
    }
}
