use axum::{routing::post, Router};

use super::handlers;

pub fn calculator_routes() -> Router {
    Router::new()
        .route("/calculator/credit", post(handlers::credit_handler))
        .route("/calculator/mortgage", post(handlers::mortgage_handler))
}
