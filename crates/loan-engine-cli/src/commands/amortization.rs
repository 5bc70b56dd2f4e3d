use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_engine_core::amortization::{self, AmortizationInput};
use loan_engine_core::elapsed::{self, ElapsedInput};

use super::RepaymentArg;
use crate::input;

/// Arguments for a full amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 15 for 15%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Repayment type
    #[arg(long, value_enum, default_value = "annuity")]
    pub repayment_type: RepaymentArg,

    /// Date of the loan's first month (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Day of the month installments fall due
    #[arg(long)]
    pub payment_day: Option<u32>,

    /// Show only the first/last year and every twelfth month
    #[arg(long)]
    pub sampled: bool,
}

/// Arguments for elapsed-term reconstruction
#[derive(Args)]
pub struct ElapsedArgs {
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

    /// Date of the loan's first month (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Day of the month installments fall due
    #[arg(long)]
    pub payment_day: Option<u32>,

    /// Outstanding balance reported by the lender
    #[arg(long)]
    pub known_remaining: Option<Decimal>,

    /// Contractual monthly payment, if not the annuity payment
    #[arg(long)]
    pub monthly_payment: Option<Decimal>,
}

pub fn run_amortize(args: AmortizeArgs, as_of: Option<NaiveDate>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut schedule_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AmortizationInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
            repayment_type: args.repayment_type.into(),
            start_date: args.start_date,
            payment_day: args.payment_day,
            as_of: None,
            sampled: args.sampled,
        }
    };
    if schedule_input.as_of.is_none() {
        schedule_input.as_of = as_of;
    }

    let result = amortization::build_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_elapsed(args: ElapsedArgs, as_of: Option<NaiveDate>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut elapsed_input: ElapsedInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ElapsedInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
            start_date: args.start_date,
            payment_day: args.payment_day,
            as_of: None,
            known_remaining: args.known_remaining,
            monthly_payment: args.monthly_payment,
        }
    };
    if elapsed_input.as_of.is_none() {
        elapsed_input.as_of = as_of;
    }

    let result = elapsed::elapsed_state(&elapsed_input)?;
    Ok(serde_json::to_value(result)?)
}
