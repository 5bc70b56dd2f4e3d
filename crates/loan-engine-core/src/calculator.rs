//! Credit and mortgage calculators in the dashboard's JSON shape.
//!
//! These compose the amortization, elapsed-term and recurring-extra
//! operations into the request/response records served at
//! `/calculator/credit` and `/calculator/mortgage`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::{compute_amortization_with, run_schedule, sample_schedule, summarize, ScheduleEntry};
use crate::early_payment::{simulate_recurring_extra, RecurringExtraPlan};
use crate::elapsed::{self, months_passed, state_from_entries};
use crate::error::LoanEngineError;
use crate::types::*;
use crate::LoanEngineResult;

// ---------------------------------------------------------------------------
// Credit calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCalculatorRequest {
    pub amount: Money,
    /// Annual rate in percent.
    pub interest_rate: Percent,
    pub term_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
    /// Truncate the returned schedule to this many rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStrategy {
    pub term_months: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub overpayment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditStrategies {
    pub base: BaseStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_extra: Option<RecurringExtraPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCalculatorResponse {
    pub monthly_payment: Money,
    pub overpayment: Money,
    pub total_payment: Money,
    pub months_passed: u32,
    pub paid_principal: Money,
    pub paid_interest: Money,
    pub current_remaining: Money,
    pub remaining_months: u32,
    pub schedule: Vec<ScheduleEntry>,
    pub strategies: CreditStrategies,
}

/// Full credit calculation: schedule, elapsed progress and strategies.
pub fn calculate_credit(req: &CreditCalculatorRequest) -> LoanEngineResult<CreditCalculatorResponse> {
    let terms = LoanTerms {
        principal: req.amount,
        annual_rate_percent: req.interest_rate,
        term_months: req.term_months,
        start_date: req.start_date,
        payment_day: req.payment_day,
    };
    terms.validate()?;

    let as_of = req.as_of.unwrap_or_else(elapsed::today);
    let passed = months_passed(&terms, as_of)?;

    let (payment, installments) = run_schedule(
        terms.principal,
        terms.monthly_rate(),
        terms.term_months,
        RepaymentType::Annuity,
    )?;
    let contractual = summarize(terms.principal, payment, &installments, RepaymentType::Annuity, passed);
    let state = state_from_entries(terms.principal, terms.term_months, &contractual.schedule, passed);

    let base = BaseStrategy {
        term_months: terms.term_months,
        monthly_payment: contractual.monthly_payment,
        total_payment: contractual.total_payment,
        overpayment: contractual.overpayment,
    };

    let with_extra = match req.extra_payment {
        Some(extra) if extra > Decimal::ZERO => Some(simulate_recurring_extra(&terms, extra, as_of)?),
        Some(extra) if extra < Decimal::ZERO => {
            return Err(LoanEngineError::invalid(
                "extra_payment",
                "Extra payment cannot be negative",
            ));
        }
        _ => None,
    };

    let mut schedule = contractual.schedule;
    if let Some(limit) = req.schedule_limit {
        schedule.truncate(limit);
    }

    Ok(CreditCalculatorResponse {
        monthly_payment: base.monthly_payment,
        overpayment: base.overpayment,
        total_payment: base.total_payment,
        months_passed: state.months_passed,
        paid_principal: state.paid_principal,
        paid_interest: state.paid_interest,
        current_remaining: state.current_remaining,
        remaining_months: state.remaining_months,
        schedule,
        strategies: CreditStrategies { base, with_extra },
    })
}

// ---------------------------------------------------------------------------
// Mortgage calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageCalculatorRequest {
    pub property_value: Money,
    #[serde(default)]
    pub down_payment: Money,
    /// Annual rate in percent.
    pub interest_rate: Percent,
    pub term_months: u32,
    #[serde(default)]
    pub payment_type: RepaymentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageCalculatorResponse {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub monthly_payment_last: Money,
    pub total_payment: Money,
    pub overpayment: Money,
    /// First year, last year and every twelfth month in between.
    pub schedule: Vec<ScheduleEntry>,
}

/// Mortgage calculation over the financed part of the property value.
pub fn calculate_mortgage(req: &MortgageCalculatorRequest) -> LoanEngineResult<MortgageCalculatorResponse> {
    if req.down_payment < Decimal::ZERO {
        return Err(LoanEngineError::invalid("down_payment", "Down payment cannot be negative"));
    }
    if req.down_payment >= req.property_value {
        return Err(LoanEngineError::invalid(
            "down_payment",
            "Down payment must be less than the property value",
        ));
    }

    let loan_amount = req.property_value - req.down_payment;
    let result = compute_amortization_with(loan_amount, req.interest_rate, req.term_months, req.payment_type)?;

    Ok(MortgageCalculatorResponse {
        loan_amount,
        monthly_payment: result.monthly_payment,
        monthly_payment_last: result.final_payment,
        total_payment: result.total_payment,
        overpayment: result.overpayment,
        schedule: sample_schedule(&result.schedule, req.term_months),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn credit_request() -> CreditCalculatorRequest {
        CreditCalculatorRequest {
            amount: dec!(500000),
            interest_rate: dec!(15),
            term_months: 36,
            extra_payment: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 20),
            payment_day: None,
            schedule_limit: None,
            as_of: NaiveDate::from_ymd_opt(2024, 7, 25),
        }
    }

    #[test]
    fn test_credit_response_shape() {
        let resp = calculate_credit(&credit_request()).unwrap();
        assert_eq!(resp.monthly_payment, dec!(17332.66));
        assert_eq!(resp.months_passed, 6);
        assert_eq!(resp.remaining_months, 30);
        assert_eq!(resp.schedule.len(), 36);
        assert_eq!(resp.schedule.iter().filter(|e| e.is_paid).count(), 6);
        assert_eq!(resp.current_remaining, resp.schedule[5].remaining);
        assert!(resp.strategies.with_extra.is_none());

        let json = serde_json::to_value(&resp).unwrap();
        for key in ["monthly_payment", "months_passed", "paid_interest", "schedule", "strategies"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["schedule"][0].get("is_paid").is_some());
    }

    #[test]
    fn test_credit_with_extra_strategy() {
        let mut req = credit_request();
        req.extra_payment = Some(dec!(10000));
        req.schedule_limit = Some(12);
        let resp = calculate_credit(&req).unwrap();
        let extra = resp.strategies.with_extra.unwrap();
        assert!(extra.months_saved > 0);
        assert!(extra.savings > Decimal::ZERO);
        assert_eq!(extra.remaining_months, extra.term_months - 6);
        assert_eq!(resp.schedule.len(), 12);
    }

    #[test]
    fn test_credit_request_from_dashboard_json() {
        let req: CreditCalculatorRequest = serde_json::from_str(
            r#"{"amount": 100000, "interest_rate": 0, "term_months": 10, "extra_payment": 0}"#,
        )
        .unwrap();
        let resp = calculate_credit(&req).unwrap();
        assert_eq!(resp.monthly_payment, dec!(10000));
        assert_eq!(resp.overpayment, Decimal::ZERO);
        assert_eq!(resp.months_passed, 0);
    }

    #[test]
    fn test_mortgage_annuity() {
        let req = MortgageCalculatorRequest {
            property_value: dec!(6000000),
            down_payment: dec!(1200000),
            interest_rate: dec!(6),
            term_months: 240,
            payment_type: RepaymentType::Annuity,
        };
        let resp = calculate_mortgage(&req).unwrap();
        assert_eq!(resp.loan_amount, dec!(4800000));
        assert!((resp.monthly_payment_last - resp.monthly_payment).abs() <= dec!(0.02));
        // 1..=12, 229..=240 and 24, 36, ..., 228
        assert_eq!(resp.schedule.len(), 42);
    }

    #[test]
    fn test_mortgage_differentiated() {
        let req = MortgageCalculatorRequest {
            property_value: dec!(1200000),
            down_payment: Decimal::ZERO,
            interest_rate: dec!(12),
            term_months: 120,
            payment_type: RepaymentType::Differentiated,
        };
        let resp = calculate_mortgage(&req).unwrap();
        assert_eq!(resp.monthly_payment, dec!(22000));
        assert_eq!(resp.monthly_payment_last, dec!(10100));
    }

    #[test]
    fn test_mortgage_rejects_full_down_payment() {
        let req = MortgageCalculatorRequest {
            property_value: dec!(100000),
            down_payment: dec!(100000),
            interest_rate: dec!(5),
            term_months: 120,
            payment_type: RepaymentType::Annuity,
        };
        assert!(calculate_mortgage(&req).is_err());
    }
}
