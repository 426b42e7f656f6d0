//! Webhook ingress (spec §4.7, §6): `POST /api/webhook/{source}` turns a
//! media server's "new episode aired" event into a
//! `webhook_search_and_dispatch` task submission.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::AppState;
use crate::models::{MediaType, QueueType, TaskType, WebhookDispatchParams};
use crate::services::task_manager::{NewTask, SubmitError};
use crate::services::webhook::webhook_dispatch_factory;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub anime_title: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub current_episode_index: Option<i32>,
    #[serde(default)]
    pub search_keyword: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub selected_episodes: Option<Vec<i32>>,
    #[serde(default)]
    pub douban_id: Option<String>,
    #[serde(default)]
    pub tmdb_id: Option<i32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tvdb_id: Option<i32>,
    #[serde(default)]
    pub bangumi_id: Option<i32>,
}

pub async fn ingest(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let params = WebhookDispatchParams {
        anime_title: payload.anime_title,
        media_type: payload.media_type.as_deref().map(MediaType::parse).unwrap_or(MediaType::TvSeries),
        season: payload.season.unwrap_or(1),
        current_episode_index: payload.current_episode_index,
        search_keyword: payload.search_keyword,
        douban_id: payload.douban_id,
        tmdb_id: payload.tmdb_id,
        imdb_id: payload.imdb_id,
        tvdb_id: payload.tvdb_id,
        bangumi_id: payload.bangumi_id,
        year: payload.year,
        selected_episodes: payload.selected_episodes,
        webhook_source: source,
    };

    let ctx = state.task_context();
    let name_conversion_enabled = state.config_store.name_conversion_enabled().await;
    let name_conversion_priority = state.config_store.name_conversion_source_priority().await;

    let factory = webhook_dispatch_factory(
        ctx,
        std::sync::Arc::clone(&state.task_manager),
        state.webhook_locks.clone(),
        name_conversion_enabled,
        name_conversion_priority,
        params.clone(),
    );

    let new_task = NewTask {
        title: params.anime_title.clone(),
        queue_type: QueueType::Fallback,
        unique_key: None,
        task_type: Some(TaskType::WebhookSearchAndDispatch),
        task_parameters: serde_json::to_string(&params).ok(),
        provider: None,
        factory,
        run_immediately: false,
    };

    match state.task_manager.submit(new_task).await {
        Ok((task_id, _)) => Ok(Json(serde_json::json!({ "task_id": task_id }))),
        Err(SubmitError::Conflict) => Ok(Json(serde_json::json!({ "status": "already queued" }))),
        Err(SubmitError::Other(e)) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
