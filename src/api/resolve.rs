//! Certificate data resolution endpoint
//!
//! The single hydrator endpoint: reads the configured trusted header, runs
//! the validation hydrator and returns the derived identity for downstream
//! authorization, or a structured 400/401 error body.

use axum::{extract::State, http::HeaderMap, Json};
use tracing::info;

use crate::cert::Identity;
use crate::utils::error::AppError;
use crate::AppState;

/// Resolve forwarded certificate data into a caller identity.
pub async fn resolve_certificate_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Identity>, AppError> {
    let header_name = state.config.hydrator.certificate_header.as_str();
    let header_value = headers
        .get(header_name)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| {
            AppError::BadRequest("certificate data header is not valid UTF-8".to_string())
        })?;

    let identity = state.hydrator.resolve(header_value)?;

    info!(
        consumer_id = %identity.consumer_id,
        consumer_type = ?identity.consumer_type,
        "Certificate data resolved"
    );

    Ok(Json(identity))
}
