// handlers/mod.rs - service-level endpoints plus the owner sub-API
pub mod owner;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Chalet Owner API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": "POST /owner/register, POST /owner/login, GET /owner/details/:ownerId",
            "protected": "GET /owner/reservations, PATCH /owner/reservations/:reservationId, PATCH /owner/chalets/:chaletId, POST /owner/chalets/:chaletId/images",
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": "unavailable"
                })),
            )
        }
    }
}
