use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::verify_token;
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Authenticated owner resolved from the bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Subject claim exactly as signed; handlers decide how to parse it.
    pub owner_id: String,
}

/// Bearer-token gate. Attaches a [`Principal`] or halts with 401.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = authenticate(request.headers(), &state.config.security)?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Resolve the caller from the `Authorization` header.
///
/// Signature and expiry failures share one message so callers cannot tell them apart.
pub fn authenticate(headers: &HeaderMap, security: &SecurityConfig) -> Result<Principal, ApiError> {
    let token = extract_bearer(headers)?;

    let claims = verify_token(token, security).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized(INVALID_TOKEN)
    })?;

    Ok(Principal { owner_id: claims.sub })
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let value = header.to_str().map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::unauthorized(INVALID_TOKEN)),
    }
}
