//! Health check endpoints
//!
//! Provides health check endpoints for monitoring and load balancers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Basic health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Detailed health response with revocation cache state
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub version: String,
    pub revocation: RevocationHealth,
}

/// State of the revocation cache
#[derive(Serialize)]
pub struct RevocationHealth {
    /// Generation of the currently published set; 0 until the first load
    pub generation: u64,
    /// Number of revoked fingerprints in the published set
    pub entries: usize,
    /// Whether the loader has published at least once since startup
    pub initial_load_complete: bool,
}

/// Simple health check endpoint (for load balancers)
///
/// Returns 200 OK if the service is running.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Detailed health check endpoint
///
/// Reports the revocation cache generation and size so operators can see
/// whether the loader is keeping the set fresh. A not-yet-loaded cache is
/// still "healthy": the service intentionally serves before the first load.
pub async fn health_check_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let revocations = &state.revocations;
    Json(DetailedHealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        revocation: RevocationHealth {
            generation: revocations.generation(),
            entries: revocations.len(),
            initial_load_complete: revocations.has_loaded(),
        },
    })
}
