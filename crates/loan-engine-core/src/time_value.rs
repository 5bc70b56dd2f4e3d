use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::LoanEngineError;
use crate::types::{Money, Rate};
use crate::LoanEngineResult;

/// Term solutions within this many decimal places of a whole month are
/// treated as that month before rounding up.
const TERM_SNAP_DP: u32 = 6;

/// Compound growth factor (1 + r)^n.
pub fn growth_factor(rate: Rate, nper: u32) -> LoanEngineResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(nper as u64)
        .ok_or_else(|| LoanEngineError::Overflow {
            context: format!("(1 + {rate})^{nper}"),
        })
}

/// One month of interest on `balance`.
pub fn accrue(balance: Money, rate: Rate) -> LoanEngineResult<Money> {
    balance
        .checked_mul(rate)
        .ok_or_else(|| LoanEngineError::Overflow {
            context: format!("interest on {balance} at {rate}"),
        })
}

/// Level payment that amortises `principal` over `nper` periods.
///
/// `P·r·(1+r)^n / ((1+r)^n − 1)`, or `P / n` for an interest-free loan.
pub fn annuity_payment(principal: Money, rate: Rate, nper: u32) -> LoanEngineResult<Money> {
    if nper == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate cannot be negative".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = growth_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(LoanEngineError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .map(|v| v / denominator)
        .ok_or_else(|| LoanEngineError::Overflow {
            context: "annuity payment".into(),
        })
}

/// Number of level payments needed to retire `balance`.
///
/// `ceil(−ln(1 − B·r/P) / ln(1 + r))`, or `ceil(B / P)` when r = 0.
pub fn remaining_term(balance: Money, rate: Rate, payment: Money) -> LoanEngineResult<u32> {
    if balance <= Decimal::ZERO {
        return Ok(0);
    }
    if payment <= Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "payment".into(),
            reason: "Payment must be positive".into(),
        });
    }

    let months = if rate.is_zero() {
        balance / payment
    } else {
        let interest = accrue(balance, rate)?;
        if payment <= interest {
            return Err(LoanEngineError::NonAmortizing { payment, interest });
        }
        let numerator = (Decimal::ONE - interest / payment)
            .checked_ln()
            .ok_or_else(|| LoanEngineError::Overflow {
                context: "remaining term logarithm".into(),
            })?;
        let denominator = (Decimal::ONE + rate).ln();
        if denominator.is_zero() {
            return Err(LoanEngineError::DivisionByZero {
                context: "remaining term".into(),
            });
        }
        -numerator / denominator
    };

    months
        .round_dp(TERM_SNAP_DP)
        .ceil()
        .to_u32()
        .ok_or_else(|| LoanEngineError::Overflow {
            context: "remaining term exceeds u32".into(),
        })
}
