use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::LoanEngineError;
use crate::LoanEngineResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.0125 = 1.25% per month).
pub type Rate = Decimal;

/// Annual rates as quoted to borrowers (15 = 15% p.a.).
pub type Percent = Decimal;

/// Display precision for money columns.
pub const MONEY_DP: u32 = 2;

/// Round a monetary value to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an annual percentage rate into a monthly decimal rate.
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(12)
}

/// Early-payment strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Keep the monthly payment, shorten the term
    #[default]
    #[serde(alias = "term")]
    ReduceTerm,
    /// Keep the term, lower the monthly payment
    #[serde(alias = "payment")]
    ReducePayment,
}

/// How principal is repaid over the term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentType {
    /// Fixed monthly payment
    #[default]
    Annuity,
    /// Fixed principal portion, declining payment
    Differentiated,
}

/// Contractual terms of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Day of month installments fall due; defaults to the start date's day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate_percent: Percent, term_months: u32) -> Self {
        LoanTerms {
            principal,
            annual_rate_percent,
            term_months,
            start_date: None,
            payment_day: None,
        }
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn monthly_rate(&self) -> Rate {
        monthly_rate(self.annual_rate_percent)
    }

    pub fn validate(&self) -> LoanEngineResult<()> {
        validate_loan(self.principal, self.annual_rate_percent, self.term_months)?;
        if let Some(day) = self.payment_day {
            if !(1..=31).contains(&day) {
                return Err(LoanEngineError::invalid(
                    "payment_day",
                    "Payment day must be between 1 and 31",
                ));
            }
        }
        Ok(())
    }
}

/// Shared guard for the three numeric loan parameters.
pub fn validate_loan(principal: Money, annual_rate_percent: Percent, term_months: u32) -> LoanEngineResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LoanEngineError::invalid("principal", "Loan principal must be positive"));
    }
    if term_months == 0 {
        return Err(LoanEngineError::invalid("term_months", "Term must be at least 1 month"));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(LoanEngineError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }
    Ok(())
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate() {
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
        assert_eq!(monthly_rate(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_round_money_half_away() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(17332.6449)), dec!(17332.64));
    }

    #[test]
    fn test_validate_rejects_bad_terms() {
        assert!(LoanTerms::new(dec!(0), dec!(10), 12).validate().is_err());
        assert!(LoanTerms::new(dec!(1000), dec!(10), 0).validate().is_err());
        assert!(LoanTerms::new(dec!(1000), dec!(-1), 12).validate().is_err());
        let mut terms = LoanTerms::new(dec!(1000), dec!(10), 12);
        terms.payment_day = Some(32);
        assert!(terms.validate().is_err());
        terms.payment_day = Some(15);
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_strategy_aliases() {
        let s: Strategy = serde_json::from_str("\"term\"").unwrap();
        assert_eq!(s, Strategy::ReduceTerm);
        let s: Strategy = serde_json::from_str("\"reduce_payment\"").unwrap();
        assert_eq!(s, Strategy::ReducePayment);
    }
}
