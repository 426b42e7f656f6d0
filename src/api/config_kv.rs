//! Dynamic config KV store (spec §6), mirroring the original's
//! `settings_routes.py`: `GET /api/config` lists every override,
//! `PUT /api/config/{key}` sets one.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::AppState;

pub async fn get_all(State(state): State<AppState>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let entries = state.config_store.all().await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let map: serde_json::Map<String, serde_json::Value> = entries.into_iter().map(|(k, v)| (k, serde_json::Value::String(v))).collect();
    Ok(Json(serde_json::Value::Object(map)))
}

#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    pub value: String,
}

pub async fn set_one(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<SetConfigRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.config_store.set(&key, &body.value).await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
