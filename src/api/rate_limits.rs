//! Rate limiter inspection/configuration (spec §6), mirroring the
//! original's `rate_limit_routes.py`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::AppState;

pub async fn get_status(State(state): State<AppState>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let (limited, retry_after_secs) = state.rate_limiter.get_global_limit_status().await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(serde_json::json!({ "global_limited": limited, "retry_after_secs": retry_after_secs })))
}

#[derive(Debug, Deserialize)]
pub struct SetLimitRequest {
    pub limit: i32,
}

/// Updates a provider's quota in the live limiter; also persisted to the
/// dynamic config store for visibility across restarts. No-op (with a
/// 409) when the rate limiter is disabled.
pub async fn set_limit(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<SetLimitRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let Some(quotas) = &state.quotas else {
        return Err((StatusCode::CONFLICT, "rate limiter is disabled".to_string()));
    };
    quotas.set_provider_limit(&provider, body.limit);
    state
        .config_store
        .set(&format!("rateLimit.{provider}"), &body.limit.to_string())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
