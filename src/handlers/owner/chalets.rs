// handlers/owner/chalets.rs - chalet edits and image uploads for the owning account

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use futures::future::try_join_all;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{JsonBody, OrInternal};
use crate::database::models::{Chalet, ChaletUpdate};
use crate::error::ApiError;
use crate::images::{ImageError, ImageUpload};
use crate::middleware::Principal;
use crate::state::AppState;

const NOT_OWNED: &str = "Chalet not found or you do not own this chalet";
const IMAGE_FIELD: &str = "images";

async fn owned_chalet(
    state: &AppState,
    chalet_id: Uuid,
    principal: &Principal,
    failed: &'static str,
) -> Result<Chalet, ApiError> {
    let Ok(owner_id) = Uuid::parse_str(&principal.owner_id) else {
        return Err(ApiError::not_found(NOT_OWNED));
    };

    state
        .store
        .find_owned_chalet(chalet_id, owner_id)
        .await
        .or_internal(state, failed)?
        .ok_or_else(|| ApiError::not_found(NOT_OWNED))
}

/// PATCH /owner/chalets/:chaletId - change allow-listed chalet fields
pub async fn edit_chalet(
    State(state): State<AppState>,
    Path(chalet_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    JsonBody(update): JsonBody<ChaletUpdate>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error updating chalet information";

    let mut chalet = owned_chalet(&state, chalet_id, &principal, FAILED).await?;
    update.apply(&mut chalet);
    let saved = state.store.save_chalet(&chalet).await.or_internal(&state, FAILED)?;

    tracing::info!(chalet_id = %saved.id, "Chalet updated");

    Ok(Json(json!({
        "message": "Chalet information updated successfully",
        "chalet": saved,
    })))
}

/// POST /owner/chalets/:chaletId/images - append pictures to a chalet
///
/// Files arrive as multipart parts named `images`. All uploads run
/// concurrently; if any fails nothing is recorded on the chalet.
pub async fn upload_images(
    State(state): State<AppState>,
    Path(chalet_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error uploading chalet images";

    let mut chalet = owned_chalet(&state, chalet_id, &principal, FAILED).await?;

    let uploads = read_images(multipart).await?;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No images provided"));
    }

    let count = uploads.len();
    let images = try_join_all(uploads.into_iter().map(|upload| state.images.upload(upload)))
        .await
        .map_err(|e| match e {
            ImageError::NotConfigured => ApiError::service_unavailable("Image uploads are not configured"),
            other => {
                tracing::error!(chalet_id = %chalet_id, "Image upload failed: {}", other);
                ApiError::bad_gateway(FAILED)
            }
        })?;

    chalet.images.extend(images);
    chalet.updated_at = chrono::Utc::now();
    let saved = state.store.save_chalet(&chalet).await.or_internal(&state, FAILED)?;

    tracing::info!(chalet_id = %saved.id, count, "Chalet images uploaded");

    Ok(Json(json!({
        "message": "Chalet images uploaded successfully",
        "chalet": saved,
    })))
}

async fn read_images(mut multipart: Multipart) -> Result<Vec<ImageUpload>, ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
        if bytes.is_empty() {
            continue;
        }

        uploads.push(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(uploads)
}
