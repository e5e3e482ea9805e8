//! API endpoints

pub mod health;
pub mod resolve;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Build the API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
        .route(
            "/v1/certificate/data/resolve",
            post(resolve::resolve_certificate_data),
        )
}
