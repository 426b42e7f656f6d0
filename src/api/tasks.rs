//! Task manager control surface (spec §6): list/pause/resume/abort/cancel.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::AppState;

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let tasks = state.store.list_tasks().await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(serde_json::json!({ "tasks": tasks })))
}

pub async fn pause_task(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.task_manager.pause_task(&id).await { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

pub async fn resume_task(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.task_manager.resume_task(&id).await { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

pub async fn abort_task(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.task_manager.abort_current_task(&id).await { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

pub async fn cancel_task(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.task_manager.cancel_pending_task(&id).await { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}
