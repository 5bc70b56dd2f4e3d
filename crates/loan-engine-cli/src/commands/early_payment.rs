use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_engine_core::early_payment::{self, EarlyPaymentInput, RecurringExtraInput};
use loan_engine_core::strategy::{self, CompareInput};

use super::StrategyArg;
use crate::input;

/// Arguments for a lump-sum early payment
#[derive(Args)]
pub struct EarlyPaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding balance before the early payment
    #[arg(long)]
    pub remaining: Option<Decimal>,

    /// Monthly decimal rate (0.0125 = 1.25% per month)
    #[arg(long)]
    pub monthly_rate: Option<Decimal>,

    /// Current monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Months left on the loan
    #[arg(long)]
    pub months: Option<u32>,

    /// Lump sum paid early
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Which side of the loan absorbs the early payment
    #[arg(long, value_enum, default_value = "term")]
    pub strategy: StrategyArg,
}

/// Arguments for comparing both early-payment strategies
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding balance before the early payment
    #[arg(long)]
    pub remaining: Option<Decimal>,

    /// Monthly decimal rate
    #[arg(long)]
    pub monthly_rate: Option<Decimal>,

    /// Current monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Months left on the loan
    #[arg(long)]
    pub months: Option<u32>,

    /// Lump sum paid early
    #[arg(long)]
    pub extra: Option<Decimal>,
}

/// Arguments for a recurring monthly extra payment
#[derive(Args)]
pub struct RecurringExtraArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Amount added to every future installment
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Date of the loan's first month (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Day of the month installments fall due
    #[arg(long)]
    pub payment_day: Option<u32>,
}

pub fn run_early_payment(args: EarlyPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ep_input: EarlyPaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        EarlyPaymentInput {
            current_remaining: args.remaining
                .ok_or("--remaining is required (or provide --input)")?,
            monthly_rate: args.monthly_rate
                .ok_or("--monthly-rate is required (or provide --input)")?,
            original_monthly_payment: args.payment
                .ok_or("--payment is required (or provide --input)")?,
            original_remaining_months: args.months
                .ok_or("--months is required (or provide --input)")?,
            extra_amount: args.extra
                .ok_or("--extra is required (or provide --input)")?,
            strategy: args.strategy.into(),
        }
    };

    let result = early_payment::early_payment(&ep_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let compare_input: CompareInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CompareInput {
            current_remaining: args.remaining
                .ok_or("--remaining is required (or provide --input)")?,
            monthly_rate: args.monthly_rate
                .ok_or("--monthly-rate is required (or provide --input)")?,
            original_monthly_payment: args.payment
                .ok_or("--payment is required (or provide --input)")?,
            original_remaining_months: args.months
                .ok_or("--months is required (or provide --input)")?,
            extra_amount: args.extra
                .ok_or("--extra is required (or provide --input)")?,
        }
    };

    let result = strategy::compare_strategies(&compare_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_recurring_extra(
    args: RecurringExtraArgs,
    as_of: Option<NaiveDate>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut extra_input: RecurringExtraInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        RecurringExtraInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
            monthly_extra: args.extra
                .ok_or("--extra is required (or provide --input)")?,
            start_date: args.start_date,
            payment_day: args.payment_day,
            as_of: None,
        }
    };
    if extra_input.as_of.is_none() {
        extra_input.as_of = as_of;
    }

    let result = early_payment::recurring_extra(&extra_input)?;
    Ok(serde_json::to_value(result)?)
}
