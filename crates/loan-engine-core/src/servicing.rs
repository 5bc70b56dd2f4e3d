//! Servicing an outstanding loan: posting payments, rolling due dates and
//! summarising a mortgage position.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::elapsed;
use crate::error::LoanEngineError;
use crate::time_value::{accrue, annuity_payment, remaining_term};
use crate::types::*;
use crate::LoanEngineResult;

/// Days before the due date at which a payment is flagged as soon.
const PAYMENT_SOON_DAYS: i64 = 5;

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Current servicing state of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub remaining_amount: Money,
    pub annual_rate_percent: Percent,
    pub monthly_payment: Money,
    pub remaining_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
}

/// A payment posted against a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub amount: Money,
    /// Extra payments go entirely to principal.
    #[serde(default)]
    pub is_extra: bool,
    #[serde(default)]
    pub reduce_type: Strategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub loan: LoanSnapshot,
    pub payment: PaymentInput,
}

/// Loan state after a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub principal: Money,
    pub interest: Money,
    pub remaining_amount: Money,
    pub remaining_months: u32,
    pub monthly_payment: Money,
    pub months_reduced: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,
}

/// Post a regular installment or an extra payment.
///
/// A regular installment pays the month's interest first and shortens the
/// remaining term by one month. An extra payment goes to principal and then
/// either re-solves the term (keeping the payment) or the payment (keeping
/// the term).
pub fn apply_payment(loan: &LoanSnapshot, payment: &PaymentInput) -> LoanEngineResult<PaymentOutcome> {
    if payment.amount <= Decimal::ZERO {
        return Err(LoanEngineError::invalid("amount", "Payment amount must be positive"));
    }
    if loan.remaining_amount < Decimal::ZERO {
        return Err(LoanEngineError::invalid(
            "remaining_amount",
            "Outstanding balance cannot be negative",
        ));
    }
    if loan.annual_rate_percent < Decimal::ZERO {
        return Err(LoanEngineError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }

    let rate = monthly_rate(loan.annual_rate_percent);

    if !payment.is_extra {
        let interest = accrue(loan.remaining_amount, rate)?;
        if payment.amount < interest {
            return Err(LoanEngineError::NonAmortizing {
                payment: payment.amount,
                interest,
            });
        }
        let principal = (payment.amount - interest).min(loan.remaining_amount);
        let remaining = loan.remaining_amount - principal;
        let next_payment_date = match (loan.next_payment_date, remaining > Decimal::ZERO) {
            (Some(due), true) => Some(roll_due_date(due, loan.payment_day.unwrap_or_else(|| due.day()))?),
            (due, _) => due,
        };

        return Ok(PaymentOutcome {
            principal: round_money(principal),
            interest: round_money(interest),
            remaining_amount: round_money(remaining),
            remaining_months: loan.remaining_months.saturating_sub(1),
            monthly_payment: round_money(loan.monthly_payment),
            months_reduced: 0,
            next_payment_date,
        });
    }

    let principal = payment.amount.min(loan.remaining_amount);
    let remaining = loan.remaining_amount - principal;
    let mut remaining_months = loan.remaining_months;
    let mut monthly_payment = loan.monthly_payment;

    if remaining.is_zero() {
        remaining_months = 0;
        monthly_payment = Decimal::ZERO;
    } else {
        match payment.reduce_type {
            Strategy::ReduceTerm if loan.remaining_months > 1 => {
                remaining_months = remaining_term(remaining, rate, loan.monthly_payment)?.max(1);
            }
            Strategy::ReduceTerm => {}
            Strategy::ReducePayment if loan.remaining_months > 0 => {
                monthly_payment = annuity_payment(remaining, rate, loan.remaining_months)?;
            }
            Strategy::ReducePayment => {}
        }
    }

    debug!(
        extra = %principal,
        remaining = %remaining,
        months = remaining_months,
        "extra payment posted"
    );

    Ok(PaymentOutcome {
        principal: round_money(principal),
        interest: Decimal::ZERO,
        remaining_amount: round_money(remaining),
        remaining_months,
        monthly_payment: round_money(monthly_payment),
        months_reduced: loan.remaining_months.saturating_sub(remaining_months),
        next_payment_date: loan.next_payment_date,
    })
}

/// Enveloped payment posting.
pub fn service_payment(request: &PaymentRequest) -> LoanEngineResult<ComputationOutput<PaymentOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let outcome = apply_payment(&request.loan, &request.payment)?;
    if request.payment.amount > request.loan.remaining_amount && request.payment.is_extra {
        warnings.push(format!(
            "Payment exceeds the outstanding balance; only {} applied",
            outcome.principal
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        if request.payment.is_extra {
            "Extra payment applied to principal"
        } else {
            "Regular installment: interest first, then principal"
        },
        request,
        warnings,
        elapsed,
        outcome,
    ))
}

// ---------------------------------------------------------------------------
// Due dates
// ---------------------------------------------------------------------------

/// First due date strictly after `today` for the given payment day.
pub fn next_payment_date(today: NaiveDate, payment_day: u32) -> LoanEngineResult<NaiveDate> {
    let this_month = due_date_in(today.year(), today.month(), payment_day)?;
    if this_month > today {
        Ok(this_month)
    } else {
        roll_due_date(this_month, payment_day)
    }
}

/// The due date one month after `due`.
pub fn roll_due_date(due: NaiveDate, payment_day: u32) -> LoanEngineResult<NaiveDate> {
    let (year, month) = if due.month() == 12 {
        (due.year() + 1, 1)
    } else {
        (due.year(), due.month() + 1)
    };
    due_date_in(year, month, payment_day)
}

/// Payment day within a month, clamped to the month's last day.
fn due_date_in(year: i32, month: u32, payment_day: u32) -> LoanEngineResult<NaiveDate> {
    if !(1..=31).contains(&payment_day) {
        return Err(LoanEngineError::DateError(format!(
            "payment day {payment_day} is not a day of the month"
        )));
    }
    let day = payment_day.min(elapsed::days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| LoanEngineError::DateError(format!("invalid date {year}-{month}-{day}")))
}

// ---------------------------------------------------------------------------
// Mortgage summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSnapshot {
    pub original_amount: Money,
    pub remaining_amount: Money,
    pub monthly_payment: Money,
    pub term_months: u32,
    pub property_value: Money,
    #[serde(default)]
    pub insurance_yearly: Money,
    #[serde(default)]
    pub property_tax_yearly: Money,
    #[serde(default)]
    pub extra_payments_total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortgageSummary {
    pub total_paid: Money,
    /// Share of the original principal repaid, in percent (1 dp).
    pub progress: Decimal,
    pub overpayment: Money,
    pub months_saved: u32,
    pub monthly_extra_costs: Money,
    pub total_monthly_cost: Money,
    pub equity: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_payment: Option<i64>,
    pub is_payment_soon: bool,
}

/// Headline figures for a mortgage position.
pub fn summarize_mortgage(m: &MortgageSnapshot, as_of: NaiveDate) -> LoanEngineResult<MortgageSummary> {
    if m.original_amount <= Decimal::ZERO {
        return Err(LoanEngineError::invalid("original_amount", "Original amount must be positive"));
    }
    if m.monthly_payment <= Decimal::ZERO {
        return Err(LoanEngineError::invalid("monthly_payment", "Monthly payment must be positive"));
    }

    let total_paid = m.original_amount - m.remaining_amount;
    let monthly_extra_costs = round_money((m.insurance_yearly + m.property_tax_yearly) / Decimal::from(12));
    let months_saved = (m.extra_payments_total / m.monthly_payment)
        .floor()
        .to_u32()
        .unwrap_or(0);
    let days_until_payment = m.next_payment_date.map(|d| (d - as_of).num_days());
    let contract_total = m
        .monthly_payment
        .checked_mul(Decimal::from(m.term_months))
        .ok_or_else(|| LoanEngineError::Overflow {
            context: "total contractual payments".into(),
        })?;

    Ok(MortgageSummary {
        total_paid: round_money(total_paid),
        progress: (total_paid / m.original_amount * Decimal::ONE_HUNDRED).round_dp(1),
        overpayment: round_money(contract_total - m.original_amount),
        months_saved,
        monthly_extra_costs,
        total_monthly_cost: round_money(m.monthly_payment + monthly_extra_costs),
        equity: round_money(m.property_value - m.remaining_amount),
        days_until_payment,
        is_payment_soon: days_until_payment.is_some_and(|d| d <= PAYMENT_SOON_DAYS),
    })
}

/// Enveloped mortgage summary.
pub fn mortgage_summary(m: &MortgageSnapshot) -> LoanEngineResult<ComputationOutput<MortgageSummary>> {
    let start = Instant::now();
    let as_of = m.as_of.unwrap_or_else(elapsed::today);
    let summary = summarize_mortgage(m, as_of)?;

    let mut warnings: Vec<String> = Vec::new();
    if summary.equity < Decimal::ZERO {
        warnings.push("Outstanding balance exceeds the property value".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mortgage position summary",
        m,
        warnings,
        elapsed,
        summary,
    ))
}
