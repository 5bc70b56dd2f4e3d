use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanEngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Non-amortizing loan: payment {payment} does not cover accruing interest {interest}")]
    NonAmortizing { payment: Decimal, interest: Decimal },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanEngineError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LoanEngineError::InvalidInput { .. } => "invalid_input",
            LoanEngineError::NonAmortizing { .. } => "non_amortizing",
            LoanEngineError::Overflow { .. } => "overflow",
            LoanEngineError::DivisionByZero { .. } => "division_by_zero",
            LoanEngineError::DateError(_) => "date_error",
            LoanEngineError::SerializationError(_) => "serialization_error",
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanEngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanEngineError {
    fn from(e: serde_json::Error) -> Self {
        LoanEngineError::SerializationError(e.to_string())
    }
}
