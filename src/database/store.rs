use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Chalet, NewOwner, Owner, Reservation, ReservationView};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistent storage for owners, chalets and reservations.
///
/// Lookups return `Ok(None)` for missing records. Saves overwrite the stored
/// record wholesale; concurrent saves of the same record are last-write-wins.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_owner_by_email(&self, email: &str) -> Result<Option<Owner>, StoreError>;

    async fn find_owner(&self, id: Uuid) -> Result<Option<Owner>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, StoreError>;

    async fn owner_chalets(&self, owner_id: Uuid) -> Result<Vec<Chalet>, StoreError>;

    /// Reservations on any of `chalet_ids`, oldest date first.
    async fn reservations_for_chalets(&self, chalet_ids: &[Uuid]) -> Result<Vec<ReservationView>, StoreError>;

    /// The reservation, only if it is on a chalet owned by `owner_id`.
    async fn find_owned_reservation(&self, reservation_id: Uuid, owner_id: Uuid)
        -> Result<Option<Reservation>, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the record no longer exists.
    async fn save_reservation(&self, reservation: &Reservation) -> Result<Reservation, StoreError>;

    /// The chalet, only if it is owned by `owner_id`.
    async fn find_owned_chalet(&self, chalet_id: Uuid, owner_id: Uuid) -> Result<Option<Chalet>, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the record no longer exists.
    async fn save_chalet(&self, chalet: &Chalet) -> Result<Chalet, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
