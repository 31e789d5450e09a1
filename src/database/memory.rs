use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::models::{
    Chalet, ChaletImage, ChaletSummary, NewOwner, Owner, Renter, Reservation, ReservationStatus, ReservationView,
};
use super::store::{Store, StoreError};
use crate::auth;

#[derive(Default)]
struct Tables {
    owners: HashMap<Uuid, Owner>,
    renters: HashMap<Uuid, Renter>,
    chalets: HashMap<Uuid, Chalet>,
    reservations: HashMap<Uuid, Reservation>,
}

/// In-process store for local runs and tests. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

/// JSON fixture accepted by [`MemoryStore::seed`]. Owner passwords are plaintext.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub owners: Vec<SeedOwner>,
    #[serde(default)]
    pub renters: Vec<Renter>,
    #[serde(default)]
    pub chalets: Vec<SeedChalet>,
    #[serde(default)]
    pub reservations: Vec<SeedReservation>,
}

#[derive(Debug, Deserialize)]
pub struct SeedOwner {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedChalet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pricing: f64,
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<ChaletImage>,
}

fn default_capacity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SeedReservation {
    pub id: Uuid,
    pub chalet_id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: ReservationStatus,
}

fn default_status() -> ReservationStatus {
    ReservationStatus::Pending
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a [`Seed`] from a JSON file and load it.
    pub async fn seed_from_file(&self, path: &Path, bcrypt_cost: u32) -> Result<(), StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
        let seed: Seed = serde_json::from_str(&raw).map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
        self.seed(seed, bcrypt_cost).await
    }

    /// Insert fixture records, hashing owner passwords. References must resolve.
    pub async fn seed(&self, seed: Seed, bcrypt_cost: u32) -> Result<(), StoreError> {
        let now = Utc::now();

        let mut owners = Vec::with_capacity(seed.owners.len());
        for owner in seed.owners {
            let password_hash = auth::hash_password(&owner.password, bcrypt_cost)
                .await
                .map_err(|e| StoreError::Seed(e.to_string()))?;
            owners.push(Owner {
                id: owner.id,
                username: owner.username,
                email: owner.email,
                password_hash,
                created_at: now,
            });
        }

        let mut tables = self.tables.write().await;
        for owner in owners {
            tables.owners.insert(owner.id, owner);
        }
        for renter in seed.renters {
            tables.renters.insert(renter.id, renter);
        }
        for chalet in seed.chalets {
            if !tables.owners.contains_key(&chalet.owner_id) {
                return Err(StoreError::Seed(format!("chalet {} references unknown owner {}", chalet.id, chalet.owner_id)));
            }
            tables.chalets.insert(
                chalet.id,
                Chalet {
                    id: chalet.id,
                    owner_id: chalet.owner_id,
                    name: chalet.name,
                    location: chalet.location,
                    description: chalet.description,
                    pricing: chalet.pricing,
                    capacity: chalet.capacity,
                    amenities: chalet.amenities,
                    images: chalet.images,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        for reservation in seed.reservations {
            if !tables.chalets.contains_key(&reservation.chalet_id) {
                return Err(StoreError::Seed(format!(
                    "reservation {} references unknown chalet {}",
                    reservation.id, reservation.chalet_id
                )));
            }
            if !tables.renters.contains_key(&reservation.user_id) {
                return Err(StoreError::Seed(format!(
                    "reservation {} references unknown renter {}",
                    reservation.id, reservation.user_id
                )));
            }
            tables.reservations.insert(
                reservation.id,
                Reservation {
                    id: reservation.id,
                    chalet_id: reservation.chalet_id,
                    user_id: reservation.user_id,
                    date: reservation.date,
                    status: reservation.status,
                    updated_at: now,
                },
            );
        }

        info!(
            "Seeded memory store: {} owners, {} chalets, {} reservations",
            tables.owners.len(),
            tables.chalets.len(),
            tables.reservations.len()
        );
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_owner_by_email(&self, email: &str) -> Result<Option<Owner>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.owners.values().find(|o| o.email == email).cloned())
    }

    async fn find_owner(&self, id: Uuid) -> Result<Option<Owner>, StoreError> {
        Ok(self.tables.read().await.owners.get(&id).cloned())
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.owners.values().any(|o| o.email == owner.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", owner.email)));
        }

        let created = Owner {
            id: Uuid::new_v4(),
            username: owner.username,
            email: owner.email,
            password_hash: owner.password_hash,
            created_at: Utc::now(),
        };
        tables.owners.insert(created.id, created.clone());
        Ok(created)
    }

    async fn owner_chalets(&self, owner_id: Uuid) -> Result<Vec<Chalet>, StoreError> {
        let tables = self.tables.read().await;
        let mut chalets: Vec<Chalet> = tables.chalets.values().filter(|c| c.owner_id == owner_id).cloned().collect();
        chalets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(chalets)
    }

    async fn reservations_for_chalets(&self, chalet_ids: &[Uuid]) -> Result<Vec<ReservationView>, StoreError> {
        let tables = self.tables.read().await;
        let mut views = Vec::new();

        for reservation in tables.reservations.values().filter(|r| chalet_ids.contains(&r.chalet_id)) {
            // Dangling references are dropped, as an inner join would.
            let (Some(chalet), Some(renter)) =
                (tables.chalets.get(&reservation.chalet_id), tables.renters.get(&reservation.user_id))
            else {
                continue;
            };
            views.push(ReservationView {
                id: reservation.id,
                date: reservation.date,
                status: reservation.status,
                chalet: ChaletSummary::from(chalet),
                user: renter.clone(),
            });
        }

        views.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(views)
    }

    async fn find_owned_reservation(
        &self,
        reservation_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        let tables = self.tables.read().await;
        let reservation = tables.reservations.get(&reservation_id).filter(|r| {
            tables
                .chalets
                .get(&r.chalet_id)
                .map(|c| c.owner_id == owner_id)
                .unwrap_or(false)
        });
        Ok(reservation.cloned())
    }

    async fn save_reservation(&self, reservation: &Reservation) -> Result<Reservation, StoreError> {
        let mut tables = self.tables.write().await;
        let mut saved = reservation.clone();
        saved.updated_at = Utc::now();
        match tables.reservations.get_mut(&reservation.id) {
            Some(slot) => *slot = saved.clone(),
            None => return Err(StoreError::NotFound(format!("reservation {}", reservation.id))),
        }
        Ok(saved)
    }

    async fn find_owned_chalet(&self, chalet_id: Uuid, owner_id: Uuid) -> Result<Option<Chalet>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.chalets.get(&chalet_id).filter(|c| c.owner_id == owner_id).cloned())
    }

    async fn save_chalet(&self, chalet: &Chalet) -> Result<Chalet, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.chalets.get_mut(&chalet.id) {
            Some(slot) => *slot = chalet.clone(),
            None => return Err(StoreError::NotFound(format!("chalet {}", chalet.id))),
        }
        Ok(chalet.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
