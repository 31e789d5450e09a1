// handlers/owner/mod.rs - owner sub-API, mounted under /owner
//
// Each route carries its own gates. Layers wrap outward, so the validation
// gate is added last and runs before the auth gate.

mod chalets;
mod details;
mod login;
mod register;
mod reservations;
pub mod schemas;

#[cfg(test)]
mod tests;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    middleware::from_fn_with_state,
    routing::{get, patch, post, MethodRouter},
    Router,
};
use serde::de::DeserializeOwned;
use std::fmt::Display;

use crate::error::ApiError;
use crate::middleware::{auth_gate, validation_gate, ValidationGate};
use crate::state::AppState;
use crate::validation::RequestSchema;

pub use chalets::{edit_chalet, upload_images};
pub use details::owner_details;
pub use login::login;
pub use register::register;
pub use reservations::{list_reservations, update_reservation};

pub fn routes(state: &AppState) -> Router<AppState> {
    let limit = state.config.api.max_request_size_bytes;
    let validated = |route: MethodRouter<AppState>, schema: RequestSchema| -> MethodRouter<AppState> {
        route.layer(from_fn_with_state(ValidationGate::new(schema, limit), validation_gate))
    };
    let protected = |route: MethodRouter<AppState>| -> MethodRouter<AppState> {
        route.layer(from_fn_with_state(state.clone(), auth_gate))
    };

    Router::new()
        .route("/register", validated(post(register), schemas::register()))
        .route("/login", validated(post(login), schemas::login()))
        .route("/reservations", protected(get(list_reservations)))
        .route(
            "/reservations/:reservationId",
            validated(protected(patch(update_reservation)), schemas::update_reservation()),
        )
        .route(
            "/chalets/:chaletId",
            validated(protected(patch(edit_chalet)), schemas::edit_chalet()),
        )
        .route(
            "/chalets/:chaletId/images",
            validated(protected(post(upload_images)), schemas::upload_images()),
        )
        .route("/details/:ownerId", validated(get(owner_details), schemas::owner_details()))
}

/// Maps collaborator failures to the handler's generic 500.
trait OrInternal<T> {
    fn or_internal(self, state: &AppState, message: &'static str) -> Result<T, ApiError>;
}

impl<T, E: Display> OrInternal<T> for Result<T, E> {
    fn or_internal(self, state: &AppState, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::internal(message, e, state.expose_error_details()))
    }
}

/// JSON request body whose rejections use the API error shape.
///
/// The content type is not checked: the validation gate has already parsed the
/// same bytes as JSON, and an empty body reads as `{}` there too.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state).await.map_err(|rejection| {
            if rejection.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large(rejection.body_text())
            } else {
                ApiError::bad_request(rejection.body_text())
            }
        })?;

        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) { b"{}" } else { &bytes };

        serde_json::from_slice(raw).map(JsonBody).map_err(|e| {
            if e.is_data() {
                ApiError::bad_request(format!("Invalid request body: {}", e))
            } else {
                ApiError::invalid_json(format!("Malformed JSON body: {}", e))
            }
        })
    }
}
