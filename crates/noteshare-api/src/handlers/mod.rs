//! HTTP handlers for noteshare-api.

pub mod notes;
pub mod subjects;

use axum::Json;

/// Liveness check. Does not touch either store.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
