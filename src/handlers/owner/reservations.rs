// handlers/owner/reservations.rs - owner reservation listing and status changes

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{JsonBody, OrInternal};
use crate::database::models::{ChaletSummary, ReservationStatus};
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::state::AppState;

/// GET /owner/reservations - every reservation on the caller's chalets, oldest date first
pub async fn list_reservations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error fetching reservations";

    let owner_id =
        Uuid::parse_str(&principal.owner_id).map_err(|_| ApiError::bad_request("Invalid owner ID format"))?;

    let owner = state.store.find_owner(owner_id).await.or_internal(&state, FAILED)?;
    if owner.is_none() {
        return Err(ApiError::not_found("Owner not found"));
    }

    let chalets = state.store.owner_chalets(owner_id).await.or_internal(&state, FAILED)?;
    let chalet_ids: Vec<Uuid> = chalets.iter().map(|chalet| chalet.id).collect();
    let reservations = state
        .store
        .reservations_for_chalets(&chalet_ids)
        .await
        .or_internal(&state, FAILED)?;

    let summaries: Vec<ChaletSummary> = chalets.iter().map(ChaletSummary::from).collect();

    Ok(Json(json!({
        "message": "Reservations fetched successfully",
        "chalets": summaries,
        "reservations": reservations,
    })))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
}

/// PATCH /owner/reservations/:reservationId - accept or reject a reservation
///
/// Reservations on chalets the caller does not own are reported as missing.
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    JsonBody(update): JsonBody<StatusUpdate>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error updating reservation";
    let not_found = || ApiError::not_found("Reservation not found");

    let owner_id = Uuid::parse_str(&principal.owner_id).map_err(|_| not_found())?;

    let mut reservation = state
        .store
        .find_owned_reservation(reservation_id, owner_id)
        .await
        .or_internal(&state, FAILED)?
        .ok_or_else(not_found)?;

    reservation.status = update.status;
    let saved = state.store.save_reservation(&reservation).await.or_internal(&state, FAILED)?;

    tracing::info!(reservation_id = %saved.id, status = %saved.status, "Reservation status changed");

    Ok(Json(json!({
        "message": format!("Reservation {} successfully", saved.status),
        "reservation": saved,
    })))
}
