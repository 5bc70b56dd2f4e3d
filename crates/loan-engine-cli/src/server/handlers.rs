use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use loan_engine_core::calculator::{
    calculate_credit, calculate_mortgage, CreditCalculatorRequest, CreditCalculatorResponse,
    MortgageCalculatorRequest, MortgageCalculatorResponse,
};
use loan_engine_core::LoanEngineError;

/// Schedule rows returned by the credit endpoint unless the request asks
/// for a different number.
pub const DASHBOARD_SCHEDULE_ROWS: usize = 36;

/// Engine failure rendered as `422 {"error": kind, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub LoanEngineError);

impl From<LoanEngineError> for ApiError {
    fn from(e: LoanEngineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(kind = self.0.kind(), error = %self.0, "calculation rejected");
        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

pub async fn credit_handler(
    Json(mut payload): Json<CreditCalculatorRequest>,
) -> Result<Json<CreditCalculatorResponse>, ApiError> {
    payload.schedule_limit.get_or_insert(DASHBOARD_SCHEDULE_ROWS);
    info!(
        amount = %payload.amount,
        rate = %payload.interest_rate,
        term = payload.term_months,
        "credit calculation"
    );
    Ok(Json(calculate_credit(&payload)?))
}

pub async fn mortgage_handler(
    Json(payload): Json<MortgageCalculatorRequest>,
) -> Result<Json<MortgageCalculatorResponse>, ApiError> {
    info!(
        property_value = %payload.property_value,
        down_payment = %payload.down_payment,
        term = payload.term_months,
        "mortgage calculation"
    );
    Ok(Json(calculate_mortgage(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use loan_engine_core::RepaymentType;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_credit_handler_zero_rate() {
        let req = CreditCalculatorRequest {
            amount: dec!(100000),
            interest_rate: Decimal::ZERO,
            term_months: 10,
            extra_payment: None,
            start_date: None,
            payment_day: None,
            schedule_limit: None,
            as_of: None,
        };
        let Json(resp) = credit_handler(Json(req)).await.unwrap();
        assert_eq!(resp.monthly_payment, dec!(10000));
        assert_eq!(resp.overpayment, Decimal::ZERO);
        assert_eq!(resp.schedule.len(), 10);
    }

    #[tokio::test]
    async fn test_credit_handler_limits_schedule_by_default() {
        let mut req = CreditCalculatorRequest {
            amount: dec!(1200000),
            interest_rate: dec!(11.5),
            term_months: 120,
            extra_payment: None,
            start_date: None,
            payment_day: None,
            schedule_limit: None,
            as_of: None,
        };
        let Json(resp) = credit_handler(Json(req.clone())).await.unwrap();
        assert_eq!(resp.schedule.len(), DASHBOARD_SCHEDULE_ROWS);
        assert_eq!(resp.schedule.last().unwrap().month, 36);

        req.schedule_limit = Some(120);
        let Json(resp) = credit_handler(Json(req)).await.unwrap();
        assert_eq!(resp.schedule.len(), 120);
    }

    #[tokio::test]
    async fn test_mortgage_handler_rejects_down_payment() {
        let req = MortgageCalculatorRequest {
            property_value: dec!(300000),
            down_payment: dec!(400000),
            interest_rate: dec!(6),
            term_months: 240,
            payment_type: RepaymentType::Annuity,
        };
        let err = mortgage_handler(Json(req)).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_input");
        assert!(body["message"].as_str().unwrap().contains("down_payment"));
    }

    #[tokio::test]
    async fn test_non_amortizing_maps_to_kind() {
        let response = ApiError(LoanEngineError::NonAmortizing {
            payment: dec!(10),
            interest: dec!(20),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "non_amortizing");
    }
}
