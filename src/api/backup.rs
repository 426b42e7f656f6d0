//! Gzip'd JSON config backup/restore (spec §6), supplementing the
//! distilled spec with the original's `api/ui/backup.py` behavior, scoped
//! down to the dynamic config KV store rather than the whole database.

use std::io::{Read, Write};

use axum::body::Bytes;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Serialize, Deserialize)]
struct BackupDocument {
    config: Vec<(String, String)>,
}

pub async fn export_backup(axum::extract::State(state): axum::extract::State<AppState>) -> Result<Response, (StatusCode, String)> {
    let config = state.config_store.all().await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let doc = BackupDocument { config };
    let json = serde_json::to_vec(&doc).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let gz = encoder.finish().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "application/gzip"), (header::CONTENT_DISPOSITION, "attachment; filename=\"meguru_backup.json.gz\"")],
        gz,
    )
        .into_response())
}

/// Replaces every row in the config KV store with the backup's contents.
/// Unrecognized keys are restored as-is; the store treats unknown keys as
/// unset defaults, so a backup from an older version never fails to load.
pub async fn restore_backup(axum::extract::State(state): axum::extract::State<AppState>, body: Bytes) -> Result<StatusCode, (StatusCode, String)> {
    let mut decoder = GzDecoder::new(body.as_ref());
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid gzip stream: {e}")))?;

    let doc: BackupDocument = serde_json::from_slice(&json).map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid backup document: {e}")))?;

    for (key, value) in doc.config {
        state.config_store.set(&key, &value).await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    }

    Ok(StatusCode::NO_CONTENT)
}
