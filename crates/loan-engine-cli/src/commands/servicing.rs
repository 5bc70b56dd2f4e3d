use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use loan_engine_core::servicing::{self, MortgageSnapshot, PaymentRequest};

use crate::input;

/// Arguments for recording a payment against a loan
#[derive(Args)]
pub struct PayArgs {
    /// Path to JSON input file with `loan` and `payment` objects
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a mortgage dashboard summary
#[derive(Args)]
pub struct MortgageSummaryArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_pay(args: PayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PaymentRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required to record a payment".into());
    };
    let result = servicing::service_payment(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_mortgage_summary(
    args: MortgageSummaryArgs,
    as_of: Option<NaiveDate>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut snapshot: MortgageSnapshot = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for the mortgage summary".into());
    };
    if snapshot.as_of.is_none() {
        snapshot.as_of = as_of;
    }
    let result = servicing::mortgage_summary(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}
