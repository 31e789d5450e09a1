// handlers/owner/details.rs - GET /owner/details/:ownerId handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::OrInternal;
use crate::error::ApiError;
use crate::state::AppState;

const FAILED: &str = "Error fetching owner details";

/// Public owner profile with a short listing of their chalets.
pub async fn owner_details(State(state): State<AppState>, Path(owner_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let owner = state
        .store
        .find_owner(owner_id)
        .await
        .or_internal(&state, FAILED)?
        .ok_or_else(|| ApiError::not_found("Owner not found"))?;

    let chalets = state.store.owner_chalets(owner.id).await.or_internal(&state, FAILED)?;

    let chalets: Vec<Value> = chalets
        .iter()
        .map(|chalet| {
            json!({
                "id": chalet.id,
                "name": chalet.name,
                "location": chalet.location,
                "pricing": chalet.pricing,
            })
        })
        .collect();

    Ok(Json(json!({
        "username": owner.username,
        "email": owner.email,
        "chalets": chalets,
    })))
}
