use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{de::DeserializeOwned, Serialize};

use loan_engine_core::LoanEngineResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Decode the JSON request, run the engine call and encode its output.
fn call_json<I, O>(input_json: &str, f: impl FnOnce(&I) -> LoanEngineResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::amortization::build_schedule)
}

#[napi]
pub fn elapsed_state(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::elapsed::elapsed_state)
}

// ---------------------------------------------------------------------------
// Early payment
// ---------------------------------------------------------------------------

#[napi]
pub fn early_payment(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::early_payment::early_payment)
}

#[napi]
pub fn compare_strategies(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::strategy::compare_strategies)
}

#[napi]
pub fn recurring_extra(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::early_payment::recurring_extra)
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

#[napi]
pub fn credit_calculator(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::calculator::calculate_credit)
}

#[napi]
pub fn mortgage_calculator(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::calculator::calculate_mortgage)
}

// ---------------------------------------------------------------------------
// Servicing
// ---------------------------------------------------------------------------

#[napi]
pub fn apply_payment(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::servicing::service_payment)
}

#[napi]
pub fn mortgage_summary(input_json: String) -> NapiResult<String> {
    call_json(&input_json, loan_engine_core::servicing::mortgage_summary)
}
