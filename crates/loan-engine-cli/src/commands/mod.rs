pub mod amortization;
pub mod calculator;
pub mod early_payment;
pub mod servicing;

use clap::ValueEnum;
use loan_engine_core::{RepaymentType, Strategy};

/// `--repayment-type` flag values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RepaymentArg {
    Annuity,
    Differentiated,
}

impl From<RepaymentArg> for RepaymentType {
    fn from(arg: RepaymentArg) -> Self {
        match arg {
            RepaymentArg::Annuity => RepaymentType::Annuity,
            RepaymentArg::Differentiated => RepaymentType::Differentiated,
        }
    }
}

/// `--strategy` flag values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Keep the payment, shorten the term
    Term,
    /// Keep the term, lower the payment
    Payment,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Term => Strategy::ReduceTerm,
            StrategyArg::Payment => Strategy::ReducePayment,
        }
    }
}
