// handlers/owner/register.rs - POST /owner/register handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{JsonBody, OrInternal};
use crate::auth;
use crate::database::{models::NewOwner, StoreError};
use crate::error::ApiError;
use crate::state::AppState;

const FAILED: &str = "Error registering owner";
const EMAIL_TAKEN: &str = "Email already exists";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// POST /owner/register - create an owner account
///
/// The email must be unused. The password is stored only as a bcrypt hash and
/// the hash never appears in the response.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let existing = state.store.find_owner_by_email(&input.email).await.or_internal(&state, FAILED)?;
    if existing.is_some() {
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    let password_hash = auth::hash_password(&input.password, state.config.security.bcrypt_cost)
        .await
        .or_internal(&state, FAILED)?;

    let new_owner = NewOwner {
        username: input.username,
        email: input.email,
        password_hash,
    };

    // A concurrent registration can still win the race to the unique index.
    let owner = match state.store.create_owner(new_owner).await {
        Ok(owner) => owner,
        Err(StoreError::Conflict(_)) => return Err(ApiError::bad_request(EMAIL_TAKEN)),
        Err(e) => return Err(ApiError::internal(FAILED, e, state.expose_error_details())),
    };

    tracing::info!(owner_id = %owner.id, "Registered owner");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Owner registered successfully",
            "owner": owner,
        })),
    ))
}
