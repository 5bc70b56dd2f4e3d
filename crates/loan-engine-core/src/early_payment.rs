//! Early (extra) payment simulation.
//!
//! A lump-sum payment is applied to the outstanding balance and the rest of
//! the loan is re-amortized either by keeping the payment (shorter term) or
//! by keeping the term (lower payment). Savings are measured against the
//! unmodified remaining schedule, replayed with the same [`Amortizer`] that
//! produces every other schedule in the crate.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::amortization::{run_schedule, total_interest, total_paid, Amortizer, Installment, PaymentRule};
use crate::elapsed::{self, months_passed};
use crate::error::LoanEngineError;
use crate::time_value::{accrue, annuity_payment};
use crate::types::*;
use crate::LoanEngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan position before a lump-sum early payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyPaymentInput {
    pub current_remaining: Money,
    /// Monthly decimal rate (0.01 = 1% per month).
    pub monthly_rate: Rate,
    pub original_monthly_payment: Money,
    pub original_remaining_months: u32,
    pub extra_amount: Money,
    #[serde(default)]
    pub strategy: Strategy,
}

/// Whether anything is left to pay after the early payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOutcome {
    /// The extra amount retires the whole balance.
    FullySettled,
    /// The remaining balance was re-amortized.
    Recalculated,
}

/// Result of applying a lump-sum payment under one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyPaymentPlan {
    pub extra_amount: Money,
    pub strategy: Strategy,
    pub outcome: PlanOutcome,
    pub new_remaining: Money,
    pub new_term_months: u32,
    pub months_saved: u32,
    pub new_payment: Money,
    pub payment_reduction: Money,
    pub interest_saved: Money,
    /// Payments still due after the early payment.
    pub total_payment: Money,
    /// Payments that were due without the early payment.
    pub total_payment_without: Money,
    /// `total_payment_without − (total_payment + extra_amount)`.
    pub economy: Money,
}

/// Input for a recurring extra amount added to every future installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringExtraInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    pub monthly_extra: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

/// Loan life with a recurring extra payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringExtraPlan {
    /// Month in which the loan is repaid, counted from the start.
    pub term_months: u32,
    pub remaining_months: u32,
    pub months_saved: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    /// Lifetime interest with the extra payments.
    pub overpayment: Money,
    /// Lifetime interest saved against the contractual schedule.
    pub savings: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply a lump-sum early payment under the requested strategy.
pub fn simulate_early_payment(input: &EarlyPaymentInput) -> LoanEngineResult<EarlyPaymentPlan> {
    validate_early_payment(input)?;

    let rate = input.monthly_rate;
    let horizon = input.original_remaining_months;
    let payment = input.original_monthly_payment;

    // The baseline is a plain replay of the remaining horizon; it always
    // terminates, even when the current payment does not cover interest.
    let baseline = Amortizer::fixed_term(input.current_remaining, rate, PaymentRule::Level(payment), horizon)
        .collect::<LoanEngineResult<Vec<Installment>>>()?;
    let interest_without = total_interest(&baseline);
    let paid_without = total_paid(&baseline);

    let new_remaining = input.current_remaining - input.extra_amount;
    if new_remaining <= Decimal::ZERO {
        debug!(
            extra = %input.extra_amount,
            remaining = %input.current_remaining,
            "early payment settles the loan"
        );
        return Ok(EarlyPaymentPlan {
            extra_amount: input.extra_amount,
            strategy: input.strategy,
            outcome: PlanOutcome::FullySettled,
            new_remaining: Decimal::ZERO,
            new_term_months: 0,
            months_saved: horizon,
            new_payment: Decimal::ZERO,
            payment_reduction: round_money(payment),
            interest_saved: round_money(interest_without),
            total_payment: Decimal::ZERO,
            total_payment_without: round_money(paid_without),
            economy: round_money(paid_without - input.current_remaining),
        });
    }

    let (new_payment, adjusted) = match input.strategy {
        Strategy::ReduceTerm => (payment, reduce_term(new_remaining, rate, payment, horizon)?),
        Strategy::ReducePayment => {
            let new_payment = annuity_payment(new_remaining, rate, horizon)?;
            let run = Amortizer::fixed_term(new_remaining, rate, PaymentRule::Level(new_payment), horizon)
                .collect::<LoanEngineResult<Vec<Installment>>>()?;
            (new_payment, run)
        }
    };

    let new_term_months = adjusted.len() as u32;
    let paid_with = total_paid(&adjusted);

    Ok(EarlyPaymentPlan {
        extra_amount: input.extra_amount,
        strategy: input.strategy,
        outcome: PlanOutcome::Recalculated,
        new_remaining: round_money(new_remaining),
        new_term_months,
        months_saved: horizon.saturating_sub(new_term_months),
        new_payment: round_money(new_payment),
        payment_reduction: round_money(payment - new_payment),
        interest_saved: round_money(interest_without - total_interest(&adjusted)),
        total_payment: round_money(paid_with),
        total_payment_without: round_money(paid_without),
        economy: round_money(paid_without - (paid_with + input.extra_amount)),
    })
}

/// Enveloped early-payment simulation.
pub fn early_payment(input: &EarlyPaymentInput) -> LoanEngineResult<ComputationOutput<EarlyPaymentPlan>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan = simulate_early_payment(input)?;

    if input.extra_amount > input.current_remaining {
        warnings.push(format!(
            "Extra amount exceeds the outstanding balance by {}",
            round_money(input.extra_amount - input.current_remaining)
        ));
    }
    if plan.outcome == PlanOutcome::Recalculated && plan.interest_saved.is_zero() {
        warnings.push("Interest-free loan: early payment saves no interest".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        match input.strategy {
            Strategy::ReduceTerm => "Early payment: keep payment, shorten term",
            Strategy::ReducePayment => "Early payment: keep term, lower payment",
        },
        input,
        warnings,
        elapsed,
        plan,
    ))
}

/// Simulate adding `monthly_extra` to every installment after the elapsed months.
pub fn simulate_recurring_extra(
    terms: &LoanTerms,
    monthly_extra: Money,
    as_of: NaiveDate,
) -> LoanEngineResult<RecurringExtraPlan> {
    terms.validate()?;
    if monthly_extra <= Decimal::ZERO {
        return Err(LoanEngineError::invalid(
            "monthly_extra",
            "Recurring extra payment must be positive",
        ));
    }

    let rate = terms.monthly_rate();
    let passed = months_passed(terms, as_of)?;
    let (payment, contractual) =
        run_schedule(terms.principal, rate, terms.term_months, RepaymentType::Annuity)?;
    let paid = &contractual[..(passed as usize).min(contractual.len())];
    let opening = paid.last().map(|i| i.remaining).unwrap_or(terms.principal);

    let boosted = payment + monthly_extra;
    let cap = terms.term_months.saturating_mul(2);
    let future = capped_payoff(opening, rate, boosted, cap)?;

    let term_months = passed + future.len() as u32;
    let lifetime_interest = total_interest(paid) + total_interest(&future);
    let contractual_interest = total_interest(&contractual);

    Ok(RecurringExtraPlan {
        term_months,
        remaining_months: term_months - passed,
        months_saved: terms.term_months.saturating_sub(term_months),
        monthly_payment: round_money(boosted),
        total_payment: round_money(total_paid(paid) + total_paid(&future)),
        overpayment: round_money(lifetime_interest),
        savings: round_money(contractual_interest - lifetime_interest),
    })
}

/// Enveloped recurring-extra simulation.
pub fn recurring_extra(
    input: &RecurringExtraInput,
) -> LoanEngineResult<ComputationOutput<RecurringExtraPlan>> {
    let start = Instant::now();
    let terms = LoanTerms {
        principal: input.principal,
        annual_rate_percent: input.annual_rate_percent,
        term_months: input.term_months,
        start_date: input.start_date,
        payment_day: input.payment_day,
    };
    let as_of = input.as_of.unwrap_or_else(elapsed::today);
    let plan = simulate_recurring_extra(&terms, input.monthly_extra, as_of)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Recurring extra payment applied after elapsed installments",
        input,
        Vec::new(),
        elapsed,
        plan,
    ))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn validate_early_payment(input: &EarlyPaymentInput) -> LoanEngineResult<()> {
    if input.current_remaining <= Decimal::ZERO {
        return Err(LoanEngineError::invalid(
            "current_remaining",
            "Outstanding balance must be positive",
        ));
    }
    if input.monthly_rate < Decimal::ZERO {
        return Err(LoanEngineError::invalid("monthly_rate", "Interest rate cannot be negative"));
    }
    if input.original_monthly_payment <= Decimal::ZERO {
        return Err(LoanEngineError::invalid(
            "original_monthly_payment",
            "Monthly payment must be positive",
        ));
    }
    if input.original_remaining_months == 0 {
        return Err(LoanEngineError::invalid(
            "original_remaining_months",
            "At least one month must remain",
        ));
    }
    if input.extra_amount <= Decimal::ZERO {
        return Err(LoanEngineError::invalid("extra_amount", "Extra payment must be positive"));
    }
    Ok(())
}

/// Keep the payment and run the balance down, capped at twice the original horizon.
fn reduce_term(balance: Money, rate: Rate, payment: Money, horizon: u32) -> LoanEngineResult<Vec<Installment>> {
    capped_payoff(balance, rate, payment, horizon.saturating_mul(2).max(1))
}

fn capped_payoff(balance: Money, rate: Rate, payment: Money, cap: u32) -> LoanEngineResult<Vec<Installment>> {
    let interest = accrue(balance, rate)?;
    if payment <= interest {
        debug!(%payment, %interest, "fixed payment does not cover interest");
        return Err(LoanEngineError::NonAmortizing { payment, interest });
    }

    let mut payoff = Amortizer::until_paid(balance, rate, payment);
    let run = payoff
        .by_ref()
        .take(cap as usize)
        .collect::<LoanEngineResult<Vec<Installment>>>()?;
    if payoff.balance() > Decimal::ZERO {
        debug!(cap, remaining = %payoff.balance(), "payoff hit iteration cap");
        return Err(LoanEngineError::NonAmortizing { payment, interest });
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input(strategy: Strategy, extra: Money) -> EarlyPaymentInput {
        EarlyPaymentInput {
            current_remaining: dec!(100000),
            monthly_rate: dec!(0.01),
            original_monthly_payment: annuity_payment(dec!(100000), dec!(0.01), 60).unwrap(),
            original_remaining_months: 60,
            extra_amount: extra,
            strategy,
        }
    }

    #[test]
    fn test_reduce_term_shortens_loan() {
        let plan = simulate_early_payment(&base_input(Strategy::ReduceTerm, dec!(20000))).unwrap();
        assert_eq!(plan.outcome, PlanOutcome::Recalculated);
        assert!(plan.new_term_months < 60);
        assert_eq!(plan.months_saved, 60 - plan.new_term_months);
        assert!(plan.interest_saved > Decimal::ZERO);
        assert_eq!(plan.payment_reduction, Decimal::ZERO);
    }

    #[test]
    fn test_reduce_payment_keeps_term() {
        let plan = simulate_early_payment(&base_input(Strategy::ReducePayment, dec!(20000))).unwrap();
        assert_eq!(plan.new_term_months, 60);
        assert_eq!(plan.months_saved, 0);
        // Payment scales with the balance: 80% of the original
        let original = annuity_payment(dec!(100000), dec!(0.01), 60).unwrap();
        assert_eq!(plan.new_payment, round_money(original * dec!(0.8)));
        assert!(plan.payment_reduction > Decimal::ZERO);
    }

    #[test]
    fn test_economy_is_consistent() {
        let plan = simulate_early_payment(&base_input(Strategy::ReduceTerm, dec!(15000))).unwrap();
        let expected = plan.total_payment_without - (plan.total_payment + plan.extra_amount);
        assert!((plan.economy - expected).abs() <= dec!(0.02));
        // Economy equals the interest saved
        assert!((plan.economy - plan.interest_saved).abs() <= dec!(0.02));
    }

    #[test]
    fn test_full_settlement_boundary() {
        let plan = simulate_early_payment(&base_input(Strategy::ReduceTerm, dec!(100000))).unwrap();
        assert_eq!(plan.outcome, PlanOutcome::FullySettled);
        assert_eq!(plan.months_saved, 60);
        assert_eq!(plan.new_term_months, 0);
        assert_eq!(plan.total_payment, Decimal::ZERO);
    }

    #[test]
    fn test_non_amortizing_detected() {
        let input = EarlyPaymentInput {
            current_remaining: dec!(100000),
            monthly_rate: dec!(0.02),
            original_monthly_payment: dec!(1500),
            original_remaining_months: 60,
            extra_amount: dec!(10000),
            strategy: Strategy::ReduceTerm,
        };
        let err = simulate_early_payment(&input).unwrap_err();
        assert!(matches!(err, LoanEngineError::NonAmortizing { .. }));
    }

    #[test]
    fn test_zero_rate_reduce_term() {
        let input = EarlyPaymentInput {
            current_remaining: dec!(12000),
            monthly_rate: Decimal::ZERO,
            original_monthly_payment: dec!(1000),
            original_remaining_months: 12,
            extra_amount: dec!(2500),
            strategy: Strategy::ReduceTerm,
        };
        let plan = simulate_early_payment(&input).unwrap();
        // 9,500 at 1,000 a month => 10 payments
        assert_eq!(plan.new_term_months, 10);
        assert_eq!(plan.months_saved, 2);
        assert_eq!(plan.interest_saved, Decimal::ZERO);
    }

    fn underwater_input(strategy: Strategy, extra: Money) -> EarlyPaymentInput {
        // 2% a month on 100,000 is 2,000; the 1,500 payment does not cover it
        EarlyPaymentInput {
            current_remaining: dec!(100000),
            monthly_rate: dec!(0.02),
            original_monthly_payment: dec!(1500),
            original_remaining_months: 60,
            extra_amount: extra,
            strategy,
        }
    }

    #[test]
    fn test_lump_sum_restores_amortization() {
        // 50,000 left accrues 1,000 a month, which 1,500 now covers
        let plan = simulate_early_payment(&underwater_input(Strategy::ReduceTerm, dec!(50000))).unwrap();
        assert_eq!(plan.outcome, PlanOutcome::Recalculated);
        // ceil(−ln(1 − 1000/1500) / ln(1.02)) = 56
        assert_eq!(plan.new_term_months, 56);
        assert_eq!(plan.months_saved, 4);
        assert!(plan.interest_saved > Decimal::ZERO);
    }

    #[test]
    fn test_settlement_precedes_interest_check() {
        let plan = simulate_early_payment(&underwater_input(Strategy::ReduceTerm, dec!(100000))).unwrap();
        assert_eq!(plan.outcome, PlanOutcome::FullySettled);
        assert_eq!(plan.new_remaining, Decimal::ZERO);
        assert_eq!(plan.months_saved, 60);
    }

    #[test]
    fn test_reduce_payment_resolves_underwater_loan() {
        let plan = simulate_early_payment(&underwater_input(Strategy::ReducePayment, dec!(10000))).unwrap();
        assert_eq!(plan.new_term_months, 60);
        // The re-solved annuity on 90,000 exceeds the old payment
        assert_eq!(plan.new_payment, round_money(annuity_payment(dec!(90000), dec!(0.02), 60).unwrap()));
        assert!(plan.payment_reduction < Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_interest_is_an_error() {
        let input = EarlyPaymentInput {
            current_remaining: dec!(100_000_000_000_000_000_000),
            monthly_rate: dec!(1_000_000_000),
            original_monthly_payment: dec!(1000),
            original_remaining_months: 12,
            extra_amount: dec!(10),
            strategy: Strategy::ReduceTerm,
        };
        let err = simulate_early_payment(&input).unwrap_err();
        assert!(matches!(err, LoanEngineError::Overflow { .. }));
    }

    #[test]
    fn test_rejects_non_positive_extra() {
        assert!(simulate_early_payment(&base_input(Strategy::ReduceTerm, Decimal::ZERO)).is_err());
    }

    #[test]
    fn test_recurring_extra_saves_interest() {
        let terms = LoanTerms::new(dec!(500000), dec!(15), 36);
        let plan = simulate_recurring_extra(&terms, dec!(5000), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        assert!(plan.term_months < 36);
        assert_eq!(plan.months_saved, 36 - plan.term_months);
        assert!(plan.savings > Decimal::ZERO);
        assert_eq!(plan.monthly_payment, dec!(22332.66));
    }
}
