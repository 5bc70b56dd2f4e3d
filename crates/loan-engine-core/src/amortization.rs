//! Fixed-payment and differentiated amortization schedules.
//!
//! Every schedule in the crate is produced by [`Amortizer`], a single
//! month-by-month stepper. The elapsed-term reconstruction and the
//! early-payment simulations replay the same stepper, so all of them agree
//! to the last unit of `Decimal` precision.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::elapsed;
use crate::error::LoanEngineError;
use crate::time_value::{accrue, annuity_payment};
use crate::types::*;
use crate::LoanEngineResult;

/// Balance below which an open-ended payoff is treated as settled.
pub const PAYOFF_EPSILON: Money = dec!(0.01);

/// Months kept at each end of a sampled long schedule.
const SAMPLE_EDGE_MONTHS: u32 = 12;

// ---------------------------------------------------------------------------
// Stepper
// ---------------------------------------------------------------------------

/// One month of amortization at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installment {
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining: Money,
}

/// How each month's principal portion is determined.
#[derive(Debug, Clone, Copy)]
pub enum PaymentRule {
    /// Level payment; principal is whatever remains after interest.
    Level(Money),
    /// Level principal; the payment is principal plus interest.
    FixedPrincipal(Money),
}

#[derive(Debug, Clone, Copy)]
enum Horizon {
    /// Stop after this many months; the last one clears the balance.
    Fixed(u32),
    /// Run until the balance drops under [`PAYOFF_EPSILON`].
    UntilPaid,
}

/// Month-by-month amortization iterator.
#[derive(Debug, Clone)]
pub struct Amortizer {
    balance: Money,
    rate: Rate,
    rule: PaymentRule,
    horizon: Horizon,
    month: u32,
    steps: u32,
}

impl Amortizer {
    /// Amortize over exactly `term` months, the last installment absorbing
    /// whatever residue the level payment leaves behind.
    pub fn fixed_term(balance: Money, rate: Rate, rule: PaymentRule, term: u32) -> Self {
        Amortizer {
            balance,
            rate,
            rule,
            horizon: Horizon::Fixed(term),
            month: 0,
            steps: 0,
        }
    }

    /// Apply the payment until the loan is repaid. The iterator is unbounded
    /// if the payment never covers the interest; callers cap it.
    pub fn until_paid(balance: Money, rate: Rate, payment: Money) -> Self {
        Amortizer {
            balance,
            rate,
            rule: PaymentRule::Level(payment),
            horizon: Horizon::UntilPaid,
            month: 0,
            steps: 0,
        }
    }

    /// Number installments after `months` already-elapsed ones.
    pub fn starting_after(mut self, months: u32) -> Self {
        self.month = months;
        self
    }

    pub fn balance(&self) -> Money {
        self.balance
    }
}

impl Amortizer {
    fn step(&mut self) -> LoanEngineResult<Installment> {
        let overflow = |context: &str| LoanEngineError::Overflow {
            context: format!("{context} in month {}", self.month + 1),
        };

        let interest = accrue(self.balance, self.rate)?;
        let mut principal = match self.rule {
            PaymentRule::Level(payment) => payment - interest,
            PaymentRule::FixedPrincipal(amount) => amount,
        };
        let closing = self
            .balance
            .checked_sub(principal)
            .ok_or_else(|| overflow("balance"))?;

        let is_last = match self.horizon {
            Horizon::Fixed(term) => self.steps + 1 == term,
            Horizon::UntilPaid => closing <= PAYOFF_EPSILON,
        };
        if is_last || principal > self.balance {
            principal = self.balance;
        }
        let payment = principal
            .checked_add(interest)
            .ok_or_else(|| overflow("payment"))?;

        self.month += 1;
        self.steps += 1;
        self.balance -= principal;

        Ok(Installment {
            month: self.month,
            payment,
            principal,
            interest,
            remaining: self.balance,
        })
    }
}

/// Yields `Err(Overflow)` once and then stops if a month cannot be
/// represented; collect into `LoanEngineResult<Vec<_>>`.
impl Iterator for Amortizer {
    type Item = LoanEngineResult<Installment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.balance <= Decimal::ZERO {
            return None;
        }
        if let Horizon::Fixed(term) = self.horizon {
            if self.steps >= term {
                return None;
            }
        }

        let step = self.step();
        if step.is_err() {
            self.balance = Decimal::ZERO;
        }
        Some(step)
    }
}

/// Sum of the interest portions of a run of installments.
pub fn total_interest(installments: &[Installment]) -> Money {
    installments.iter().map(|i| i.interest).sum()
}

/// Sum of the payments of a run of installments.
pub fn total_paid(installments: &[Installment]) -> Money {
    installments.iter().map(|i| i.payment).sum()
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A displayed schedule row, rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining: Money,
    pub is_paid: bool,
}

/// Full amortization of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// Level payment (annuity) or first payment (differentiated).
    pub monthly_payment: Money,
    pub final_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    /// Total interest over the life of the loan (total_payment − principal).
    pub overpayment: Money,
    pub schedule: Vec<ScheduleEntry>,
}

/// Input for the enveloped schedule builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    #[serde(default)]
    pub repayment_type: RepaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
    /// Valuation date for marking paid rows; defaults to today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    /// Keep only the first/last year and every twelfth month.
    #[serde(default)]
    pub sampled: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortize a fixed-payment (annuity) loan.
pub fn compute_amortization(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
) -> LoanEngineResult<AmortizationResult> {
    compute_amortization_with(principal, annual_rate_percent, term_months, RepaymentType::Annuity)
}

/// Amortize a loan with the given repayment type.
pub fn compute_amortization_with(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
    repayment_type: RepaymentType,
) -> LoanEngineResult<AmortizationResult> {
    validate_loan(principal, annual_rate_percent, term_months)?;
    let rate = monthly_rate(annual_rate_percent);
    let (payment, installments) = run_schedule(principal, rate, term_months, repayment_type)?;
    Ok(summarize(principal, payment, &installments, repayment_type, 0))
}

/// Build a schedule from an input record, marking elapsed rows as paid.
pub fn build_schedule(
    input: &AmortizationInput,
) -> LoanEngineResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = LoanTerms {
        principal: input.principal,
        annual_rate_percent: input.annual_rate_percent,
        term_months: input.term_months,
        start_date: input.start_date,
        payment_day: input.payment_day,
    };
    terms.validate()?;

    let as_of = input.as_of.unwrap_or_else(elapsed::today);
    let months_paid = elapsed::months_passed(&terms, as_of)?;

    let rate = terms.monthly_rate();
    let (payment, installments) =
        run_schedule(terms.principal, rate, terms.term_months, input.repayment_type)?;
    let mut output = summarize(terms.principal, payment, &installments, input.repayment_type, months_paid);

    if rate.is_zero() {
        warnings.push("Interest-free loan: principal repaid in equal instalments".into());
    }
    if input.sampled {
        output.schedule = sample_schedule(&output.schedule, terms.term_months);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        match input.repayment_type {
            RepaymentType::Annuity => "Annuity amortization (level monthly payment)",
            RepaymentType::Differentiated => "Differentiated amortization (level principal)",
        },
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "monthly_rate": rate.to_string(),
            "term_months": input.term_months,
            "months_paid": months_paid,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Keep months 1–12, the final 12 months and every 12th month in between.
pub fn sample_schedule(schedule: &[ScheduleEntry], term_months: u32) -> Vec<ScheduleEntry> {
    schedule
        .iter()
        .filter(|e| {
            e.month <= SAMPLE_EDGE_MONTHS
                || e.month + SAMPLE_EDGE_MONTHS > term_months
                || e.month % SAMPLE_EDGE_MONTHS == 0
        })
        .cloned()
        .collect()
}

/// Round a run of installments for display.
///
/// With a level payment every row but the last shows that payment rounded
/// to cents, split into rounded interest and the principal remainder; the
/// last row clears the displayed balance. Without one (differentiated) the
/// principal column is the difference of consecutive rounded balances.
/// Either way the displayed principals add up to the rounded opening balance
/// and `principal + interest == payment` on every row.
pub fn to_entries(
    opening_balance: Money,
    installments: &[Installment],
    level_payment: Option<Money>,
    months_paid: u32,
) -> Vec<ScheduleEntry> {
    let mut shown_balance = round_money(opening_balance);
    let last = installments.len();
    installments
        .iter()
        .enumerate()
        .map(|(i, inst)| {
            let interest = round_money(inst.interest);
            let principal = match level_payment {
                Some(level) if i + 1 < last => {
                    (round_money(level) - interest).clamp(Decimal::ZERO, shown_balance)
                }
                Some(_) => shown_balance,
                None => shown_balance - round_money(inst.remaining),
            };
            shown_balance -= principal;
            ScheduleEntry {
                month: inst.month,
                payment: principal + interest,
                principal,
                interest,
                remaining: shown_balance,
                is_paid: inst.month <= months_paid,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Level payment (or first-month principal) and the full installment run.
pub(crate) fn run_schedule(
    principal: Money,
    rate: Rate,
    term_months: u32,
    repayment_type: RepaymentType,
) -> LoanEngineResult<(Money, Vec<Installment>)> {
    let rule = payment_rule(principal, rate, term_months, repayment_type)?;
    let installments = Amortizer::fixed_term(principal, rate, rule, term_months)
        .collect::<LoanEngineResult<Vec<Installment>>>()?;
    let payment = match rule {
        PaymentRule::Level(p) => p,
        PaymentRule::FixedPrincipal(_) => installments.first().map(|i| i.payment).unwrap_or_default(),
    };
    Ok((payment, installments))
}

pub(crate) fn payment_rule(
    principal: Money,
    rate: Rate,
    term_months: u32,
    repayment_type: RepaymentType,
) -> LoanEngineResult<PaymentRule> {
    Ok(match repayment_type {
        RepaymentType::Annuity => PaymentRule::Level(annuity_payment(principal, rate, term_months)?),
        RepaymentType::Differentiated => {
            PaymentRule::FixedPrincipal(principal / Decimal::from(term_months))
        }
    })
}

/// Totals are taken from the displayed rows so they match the schedule.
pub(crate) fn summarize(
    principal: Money,
    payment: Money,
    installments: &[Installment],
    repayment_type: RepaymentType,
    months_paid: u32,
) -> AmortizationResult {
    let level = match repayment_type {
        RepaymentType::Annuity => Some(payment),
        RepaymentType::Differentiated => None,
    };
    let schedule = to_entries(principal, installments, level, months_paid);
    let total_payment: Money = schedule.iter().map(|e| e.payment).sum();
    let total_interest: Money = schedule.iter().map(|e| e.interest).sum();
    let final_payment = schedule.last().map(|e| e.payment).unwrap_or_default();

    AmortizationResult {
        monthly_payment: round_money(payment),
        final_payment,
        total_payment,
        total_interest,
        overpayment: round_money(total_payment - principal),
        schedule,
    }
}
