//! Certgate Library
//!
//! Header-based mTLS authentication hydrator. A TLS-terminating reverse
//! proxy verifies client certificates and forwards certificate data in a
//! trusted header; this crate classifies the certificate into a trust
//! domain, derives a caller identity from the Subject DN and checks
//! internally issued certificates against a periodically refreshed
//! revocation set.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod api;
pub mod cert;
pub mod config;
pub mod hydrator;
pub mod revocation;
pub mod utils;

pub use config::AppConfig;
pub use hydrator::ValidationHydrator;
pub use revocation::RevocationCache;
pub use utils::error::{AppError, ErrorResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Currently published revocation set
    pub revocations: Arc<RevocationCache>,
    /// Per-request validation orchestrator
    pub hydrator: Arc<ValidationHydrator>,
}

/// Build the application router with tracing and request timeout layers
pub fn app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    api::routes()
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
