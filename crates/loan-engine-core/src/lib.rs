pub mod amortization;
pub mod early_payment;
pub mod elapsed;
pub mod error;
pub mod strategy;
pub mod time_value;
pub mod types;

#[cfg(feature = "calculator")]
pub mod calculator;

#[cfg(feature = "servicing")]
pub mod servicing;

pub use amortization::{compute_amortization, AmortizationResult, ScheduleEntry};
pub use early_payment::{simulate_early_payment, EarlyPaymentPlan};
pub use elapsed::{reconstruct_elapsed, ElapsedState};
pub use error::LoanEngineError;
pub use strategy::{recommend, Recommendation};
pub use types::*;

/// Standard result type for all loan-engine operations
pub type LoanEngineResult<T> = Result<T, LoanEngineError>;
