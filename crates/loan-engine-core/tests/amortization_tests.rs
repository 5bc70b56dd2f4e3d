use chrono::NaiveDate;
use loan_engine_core::amortization::{self, AmortizationInput};
use loan_engine_core::elapsed;
use loan_engine_core::{compute_amortization, reconstruct_elapsed, LoanEngineError, LoanTerms, RepaymentType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Amortization consistency
// ===========================================================================

fn sample_loans() -> Vec<(Decimal, Decimal, u32)> {
    vec![
        (dec!(500000), dec!(15), 36),
        (dec!(100000), dec!(0), 10),
        (dec!(3500000), dec!(8.9), 360),
        (dec!(15999.99), dec!(29.9), 7),
        (dec!(1), dec!(5), 12),
        (dec!(250000), dec!(0.01), 120),
    ]
}

#[test]
fn test_principal_portions_sum_to_principal() {
    for (principal, rate, term) in sample_loans() {
        let r = compute_amortization(principal, rate, term).unwrap();
        let sum: Decimal = r.schedule.iter().map(|e| e.principal).sum();
        assert!(
            (sum - principal).abs() <= dec!(0.01),
            "principal {principal} at {rate}% over {term}: portions sum to {sum}"
        );
        assert_eq!(r.schedule.last().unwrap().remaining, Decimal::ZERO);
        assert_eq!(r.schedule.len(), term as usize);
    }
}

#[test]
fn test_every_row_balances() {
    for (principal, rate, term) in sample_loans() {
        let r = compute_amortization(principal, rate, term).unwrap();
        let mut prev = principal;
        for e in &r.schedule {
            assert_eq!(e.principal + e.interest, e.payment, "month {}", e.month);
            assert!(e.remaining <= prev, "balance rose in month {}", e.month);
            prev = e.remaining;
        }
    }
}

#[test]
fn test_level_payment_shown_on_every_row_but_last() {
    for (principal, rate, term) in sample_loans() {
        let r = compute_amortization(principal, rate, term).unwrap();
        let (last, rows) = r.schedule.split_last().unwrap();
        assert!(
            rows.iter().all(|e| e.payment == r.monthly_payment),
            "principal {principal} at {rate}%: a row strays from {}",
            r.monthly_payment
        );
        assert_eq!(last.payment, r.final_payment);
        assert_eq!(last.remaining, Decimal::ZERO);
    }
}

#[test]
fn test_overpayment_is_total_interest() {
    for (principal, rate, term) in sample_loans() {
        let r = compute_amortization(principal, rate, term).unwrap();
        assert_eq!(r.overpayment, r.total_payment - principal);
        assert!((r.overpayment - r.total_interest).abs() <= dec!(0.01));
    }
}

#[test]
fn test_zero_rate_scenario() {
    let r = compute_amortization(dec!(100000), Decimal::ZERO, 10).unwrap();
    assert_eq!(r.monthly_payment, dec!(10000));
    assert_eq!(r.total_payment, dec!(100000));
    assert_eq!(r.overpayment, Decimal::ZERO);
}

#[test]
fn test_known_scenario_matches_formula() {
    // P·r·(1+r)^n / ((1+r)^n − 1) with P = 500,000, r = 0.0125, n = 36
    let r = compute_amortization(dec!(500000), dec!(15), 36).unwrap();
    assert_eq!(r.monthly_payment, dec!(17332.66));
    assert!((r.total_payment - dec!(623975.91)).abs() <= dec!(0.02));
    assert!((r.overpayment - dec!(123975.91)).abs() <= dec!(0.02));
}

#[test]
fn test_invalid_input_is_rejected_without_result() {
    let err = compute_amortization(dec!(0), dec!(10), 12).unwrap_err();
    assert!(matches!(err, LoanEngineError::InvalidInput { ref field, .. } if field == "principal"));
    let err = compute_amortization(dec!(1000), dec!(10), 0).unwrap_err();
    assert!(matches!(err, LoanEngineError::InvalidInput { ref field, .. } if field == "term_months"));
}

#[test]
fn test_extreme_rate_overflows_cleanly() {
    let err = compute_amortization(dec!(1000000), dec!(100000), 600).unwrap_err();
    assert!(matches!(err, LoanEngineError::Overflow { .. }));
}

// ===========================================================================
// Elapsed / total agreement
// ===========================================================================

#[test]
fn test_elapsed_full_term_agrees_with_schedule() {
    let start = NaiveDate::from_ymd_opt(2010, 3, 5).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    for (principal, rate, term) in sample_loans().into_iter().filter(|l| l.2 <= 120) {
        let terms = LoanTerms::new(principal, rate, term).with_start_date(start);
        let state = reconstruct_elapsed(&terms, as_of).unwrap();
        let full = compute_amortization(principal, rate, term).unwrap();
        assert_eq!(state.months_passed, term);
        assert_eq!(state.current_remaining, Decimal::ZERO);
        assert_eq!(state.paid_interest, full.total_interest);
        assert_eq!(state.remaining_months, 0);
    }
}

#[test]
fn test_elapsed_midway_matches_schedule_row() {
    let terms = LoanTerms::new(dec!(3500000), dec!(8.9), 360)
        .with_start_date(NaiveDate::from_ymd_opt(2019, 8, 12).unwrap());
    let as_of = NaiveDate::from_ymd_opt(2024, 8, 11).unwrap();
    let state = reconstruct_elapsed(&terms, as_of).unwrap();
    // 60 months minus the one not yet due on the 11th
    assert_eq!(state.months_passed, 59);

    let full = compute_amortization(dec!(3500000), dec!(8.9), 360).unwrap();
    assert_eq!(state.current_remaining, full.schedule[58].remaining);
    let paid_interest: Decimal = full.schedule[..59].iter().map(|e| e.interest).sum();
    assert_eq!(state.paid_interest, paid_interest);
    assert_eq!(state.paid_principal + state.current_remaining, dec!(3500000));
}

#[test]
fn test_build_schedule_envelope() {
    let input = AmortizationInput {
        principal: dec!(2400000),
        annual_rate_percent: dec!(10.5),
        term_months: 240,
        repayment_type: RepaymentType::Annuity,
        start_date: None,
        payment_day: None,
        as_of: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        sampled: true,
    };
    let out = amortization::build_schedule(&input).unwrap();
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert!(out.result.schedule.len() < 240);
    assert!(out.result.schedule.iter().all(|e| !e.is_paid));
    assert_eq!(out.assumptions["term_months"], 240);
}

#[test]
fn test_months_passed_respects_payment_day() {
    let mut terms = LoanTerms::new(dec!(10000), dec!(10), 12)
        .with_start_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    terms.payment_day = Some(1);
    let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert_eq!(elapsed::months_passed(&terms, as_of).unwrap(), 2);
}
