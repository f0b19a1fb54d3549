use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatArbError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Misaligned input: {0}")]
    MisalignedInput(String),

    #[error("Singular regression window ending at index {index}: explanatory series has zero variance")]
    SingularWindow { index: usize },

    #[error("Invalid price at index {index}: {reason}")]
    InvalidPrice { index: usize, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StatArbError {
    fn from(e: serde_json::Error) -> Self {
        StatArbError::SerializationError(e.to_string())
    }
}
