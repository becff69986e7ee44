use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PnlError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Data error on {entity}: {reason}")]
    DataError { entity: String, reason: String },

    #[error("Invariant violated in {context}: {detail} (delta: {delta})")]
    InvariantViolation {
        context: String,
        detail: String,
        delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PnlError {
    fn from(e: serde_json::Error) -> Self {
        PnlError::SerializationError(e.to_string())
    }
}
