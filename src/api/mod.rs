//! The axum control surface (spec §6). Individual-feature CRUD endpoints
//! are out of scope (spec §1 Non-goals: HTTP surface beyond core
//! operations); only the handful of routes that directly invoke a core
//! operation are implemented here, teacher-style (one module per route
//! group, wired together in [`router`]).

pub mod auth;
pub mod backup;
pub mod config_kv;
pub mod rate_limits;
pub mod tasks;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub type AppState = Arc<SharedState>;

#[must_use]
pub async fn router(state: AppState) -> Router {
    let cors = {
        let origins = state.config().await.server.cors_allowed_origins.clone();
        if origins.iter().any(|o| o == "*") {
            CorsLayer::permissive()
        } else {
            let origins: Vec<_> = origins.into_iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new().allow_origin(origins)
        }
    };

    let protected = Router::new()
        .route("/api/tasks", get(tasks::list_tasks))
        .route("/api/tasks/{id}", delete(tasks::cancel_task))
        .route("/api/tasks/{id}/pause", post(tasks::pause_task))
        .route("/api/tasks/{id}/resume", post(tasks::resume_task))
        .route("/api/tasks/{id}/abort", post(tasks::abort_task))
        .route("/api/rate-limits", get(rate_limits::get_status))
        .route("/api/rate-limits/{provider}", put(rate_limits::set_limit))
        .route("/api/config", get(config_kv::get_all))
        .route("/api/config/{key}", put(config_kv::set_one))
        .route("/api/backup", post(backup::export_backup))
        .route("/api/backup/restore", post(backup::restore_backup))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), auth::require_api_key))
        .with_state(Arc::clone(&state));

    let webhook_routes = Router::new().route("/api/webhook/{source}", post(webhook::ingest)).with_state(Arc::clone(&state));

    Router::new().merge(protected).merge(webhook_routes).layer(TraceLayer::new_for_http()).layer(cors)
}
