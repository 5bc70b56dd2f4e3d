use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_engine_core::calculator::{
    self, CreditCalculatorRequest, MortgageCalculatorRequest,
};

use super::RepaymentArg;
use crate::input;

/// Arguments for the credit calculator
#[derive(Args)]
pub struct CreditCalcArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Recurring extra amount paid with every installment
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Date of the loan's first month (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Day of the month installments fall due
    #[arg(long)]
    pub payment_day: Option<u32>,

    /// Truncate the schedule to this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the mortgage calculator
#[derive(Args)]
pub struct MortgageCalcArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Property value
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Down payment
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Repayment type
    #[arg(long, value_enum, default_value = "annuity")]
    pub payment_type: RepaymentArg,
}

pub fn run_credit_calc(args: CreditCalcArgs, as_of: Option<NaiveDate>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: CreditCalculatorRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CreditCalculatorRequest {
            amount: args.amount
                .ok_or("--amount is required (or provide --input)")?,
            interest_rate: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
            extra_payment: args.extra,
            start_date: args.start_date,
            payment_day: args.payment_day,
            schedule_limit: args.limit,
            as_of: None,
        }
    };
    if request.as_of.is_none() {
        request.as_of = as_of;
    }

    let result = calculator::calculate_credit(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_mortgage_calc(args: MortgageCalcArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: MortgageCalculatorRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MortgageCalculatorRequest {
            property_value: args.property_value
                .ok_or("--property-value is required (or provide --input)")?,
            down_payment: args.down_payment,
            interest_rate: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
            payment_type: args.payment_type.into(),
        }
    };

    let result = calculator::calculate_mortgage(&request)?;
    Ok(serde_json::to_value(result)?)
}
