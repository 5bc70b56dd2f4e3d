use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{run_schedule, to_entries, ScheduleEntry};
use crate::error::LoanEngineError;
use crate::time_value::{annuity_payment, remaining_term};
use crate::types::*;
use crate::LoanEngineResult;

/// Repayment progress of a loan at a valuation date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedState {
    pub months_passed: u32,
    pub paid_principal: Money,
    pub paid_interest: Money,
    pub current_remaining: Money,
    pub remaining_months: u32,
}

/// Input for the enveloped elapsed-state calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElapsedInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    /// Outstanding balance reported by the lender, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_remaining: Option<Money>,
    /// Contractual payment, if it differs from the annuity payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Money>,
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole installments that have fallen due between the start date and `as_of`.
///
/// An installment falls due on `payment_day` of each month after the start
/// (the month's last day in shorter months); the current month's only counts
/// once that day has been reached. The count is clamped to the loan term.
pub fn months_passed(terms: &LoanTerms, as_of: NaiveDate) -> LoanEngineResult<u32> {
    let Some(start) = terms.start_date else {
        return Ok(0);
    };
    if start >= as_of {
        return Ok(0);
    }

    let payment_day = terms.payment_day.unwrap_or_else(|| start.day());
    if !(1..=31).contains(&payment_day) {
        return Err(LoanEngineError::DateError(format!(
            "payment day {payment_day} is not a day of the month"
        )));
    }

    let due_day = payment_day.min(days_in_month(as_of.year(), as_of.month()));
    let mut months = (as_of.year() - start.year()) as i64 * 12
        + as_of.month() as i64
        - start.month() as i64;
    if as_of.day() < due_day {
        months -= 1;
    }

    Ok(months.clamp(0, terms.term_months as i64) as u32)
}

/// Replay the contractual schedule up to `as_of`.
pub fn reconstruct_elapsed(terms: &LoanTerms, as_of: NaiveDate) -> LoanEngineResult<ElapsedState> {
    terms.validate()?;
    let passed = months_passed(terms, as_of)?;
    let (payment, installments) = run_schedule(
        terms.principal,
        terms.monthly_rate(),
        terms.term_months,
        RepaymentType::Annuity,
    )?;
    let entries = to_entries(terms.principal, &installments, Some(payment), passed);
    Ok(state_from_entries(terms.principal, terms.term_months, &entries, passed))
}

/// Elapsed state read off the displayed schedule rows.
pub(crate) fn state_from_entries(
    principal: Money,
    term_months: u32,
    entries: &[ScheduleEntry],
    months_passed: u32,
) -> ElapsedState {
    let paid = &entries[..(months_passed as usize).min(entries.len())];

    ElapsedState {
        months_passed,
        paid_principal: paid.iter().map(|e| e.principal).sum(),
        paid_interest: paid.iter().map(|e| e.interest).sum(),
        current_remaining: paid.last().map(|e| e.remaining).unwrap_or_else(|| round_money(principal)),
        remaining_months: term_months - months_passed,
    }
}

/// Number of days in a calendar month.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Elapsed state with metadata, optionally reconciled to a known balance.
pub fn elapsed_state(input: &ElapsedInput) -> LoanEngineResult<ComputationOutput<ElapsedState>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = LoanTerms {
        principal: input.principal,
        annual_rate_percent: input.annual_rate_percent,
        term_months: input.term_months,
        start_date: input.start_date,
        payment_day: input.payment_day,
    };
    let as_of = input.as_of.unwrap_or_else(today);
    let mut state = reconstruct_elapsed(&terms, as_of)?;

    if terms.start_date.is_none() {
        warnings.push("No start date: assuming no installments have been paid".into());
    }

    if let Some(known) = input.known_remaining {
        if known < Decimal::ZERO {
            return Err(LoanEngineError::invalid(
                "known_remaining",
                "Outstanding balance cannot be negative",
            ));
        }
        let rate = terms.monthly_rate();
        let payment = match input.monthly_payment {
            Some(p) => p,
            None => annuity_payment(terms.principal, rate, terms.term_months)?,
        };
        state.remaining_months = match remaining_term(known, rate, payment) {
            Ok(months) => months,
            Err(LoanEngineError::NonAmortizing { .. }) => {
                warnings.push(format!(
                    "Payment {} does not cover interest on {}; keeping contractual remaining term",
                    round_money(payment),
                    known
                ));
                state.remaining_months
            }
            Err(e) => return Err(e),
        };
        state.current_remaining = round_money(known);
        state.paid_principal = round_money((terms.principal - known).max(Decimal::ZERO));
        warnings.push("Paid interest estimated from the contractual schedule".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Elapsed-term reconstruction (contractual schedule replay)",
        &serde_json::json!({
            "as_of": as_of.to_string(),
            "start_date": terms.start_date.map(|d| d.to_string()),
            "payment_day": terms.payment_day,
            "term_months": terms.term_months,
        }),
        warnings,
        elapsed,
        state,
    ))
}
