// handlers/owner/login.rs - POST /owner/login handler

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{JsonBody, OrInternal};
use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

const FAILED: &str = "Error logging in";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /owner/login - exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let owner = state
        .store
        .find_owner_by_email(&input.email)
        .await
        .or_internal(&state, FAILED)?
        .ok_or_else(|| ApiError::not_found("Owner not found"))?;

    let matches = auth::verify_password(&input.password, &owner.password_hash)
        .await
        .or_internal(&state, FAILED)?;
    if !matches {
        tracing::debug!(owner_id = %owner.id, "Password mismatch");
        return Err(ApiError::bad_request("Invalid password"));
    }

    let token = auth::issue_token(&owner.id.to_string(), &state.config.security).or_internal(&state, FAILED)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
    })))
}
