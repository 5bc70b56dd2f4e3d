use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::early_payment::{simulate_early_payment, EarlyPaymentInput, EarlyPaymentPlan};
use crate::error::LoanEngineError;
use crate::types::*;
use crate::LoanEngineResult;

/// Advice on which early-payment strategy saves more interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub better: Strategy,
    /// Extra interest saved by the better strategy over the other one.
    pub marginal_benefit: Money,
    pub term_interest_saved: Money,
    pub payment_interest_saved: Money,
}

/// Loan position and lump sum to evaluate under both strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareInput {
    pub current_remaining: Money,
    pub monthly_rate: Rate,
    pub original_monthly_payment: Money,
    pub original_remaining_months: u32,
    pub extra_amount: Money,
}

/// Both plans side by side with the recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub reduce_term: EarlyPaymentPlan,
    pub reduce_payment: EarlyPaymentPlan,
    pub recommendation: Recommendation,
}

/// Pick the plan with the larger interest saving. Ties go to ReduceTerm.
pub fn recommend(
    plan_term: &EarlyPaymentPlan,
    plan_payment: &EarlyPaymentPlan,
) -> LoanEngineResult<Recommendation> {
    if plan_term.strategy != Strategy::ReduceTerm {
        return Err(LoanEngineError::invalid(
            "plan_term",
            "Expected a reduce-term plan",
        ));
    }
    if plan_payment.strategy != Strategy::ReducePayment {
        return Err(LoanEngineError::invalid(
            "plan_payment",
            "Expected a reduce-payment plan",
        ));
    }

    let better = if plan_term.interest_saved >= plan_payment.interest_saved {
        Strategy::ReduceTerm
    } else {
        Strategy::ReducePayment
    };
    let marginal_benefit = (plan_term.interest_saved - plan_payment.interest_saved).abs();
    debug!(?better, %marginal_benefit, "strategy recommendation");

    Ok(Recommendation {
        better,
        marginal_benefit,
        term_interest_saved: plan_term.interest_saved,
        payment_interest_saved: plan_payment.interest_saved,
    })
}

/// Simulate both strategies for the same lump sum and recommend one.
pub fn compare_strategies(
    input: &CompareInput,
) -> LoanEngineResult<ComputationOutput<StrategyComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan_for = |strategy| EarlyPaymentInput {
        current_remaining: input.current_remaining,
        monthly_rate: input.monthly_rate,
        original_monthly_payment: input.original_monthly_payment,
        original_remaining_months: input.original_remaining_months,
        extra_amount: input.extra_amount,
        strategy,
    };
    let reduce_term = simulate_early_payment(&plan_for(Strategy::ReduceTerm))?;
    let reduce_payment = simulate_early_payment(&plan_for(Strategy::ReducePayment))?;
    let recommendation = recommend(&reduce_term, &reduce_payment)?;

    if recommendation.marginal_benefit == Decimal::ZERO {
        warnings.push("Both strategies save the same interest".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Early payment strategy comparison by interest saved",
        input,
        warnings,
        elapsed,
        StrategyComparison {
            reduce_term,
            reduce_payment,
            recommendation,
        },
    ))
}
