//! Single-admin auth middleware (spec §6): bearer API key or
//! `X-Api-Key` header against [`crate::config::AuthConfig`], plus
//! per-token API keys issued through [`crate::db::Store::create_token`].
//! No multi-user RBAC and no cookie-session layer (no web UI in scope).

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use super::AppState;

fn extract_key(req: &Request) -> Option<String> {
    if let Some(header) = req.headers().get("x-api-key")
        && let Ok(s) = header.to_str()
    {
        return Some(s.to_string());
    }
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string)
}

pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(key) = extract_key(&req) else { return Err(StatusCode::UNAUTHORIZED) };

    let static_key = state.config().await.auth.api_key.clone();
    let authorized = !static_key.is_empty() && key == static_key || state.store.validate_token(&key).await.unwrap_or(false);

    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let ip = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>().map(|c| c.0.ip().to_string());
    let path = req.uri().path().to_string();
    let store = state.store.clone();
    tokio::spawn(async move {
        let _ = store.log_token_access(None, &path, ip.as_deref()).await;
    });

    Ok(next.run(req).await)
}
