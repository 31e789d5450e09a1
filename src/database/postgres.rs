use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::models::{Chalet, ChaletImage, ChaletSummary, NewOwner, Owner, Renter, Reservation, ReservationView};
use super::store::{Store, StoreError};
use crate::config::DatabaseConfig;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS owners (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS renters (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chalets (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES owners(id),
        name TEXT NOT NULL,
        location TEXT NOT NULL,
        description TEXT,
        pricing DOUBLE PRECISION NOT NULL DEFAULT 0,
        capacity INTEGER NOT NULL DEFAULT 1,
        amenities TEXT[] NOT NULL DEFAULT '{}',
        images JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id UUID PRIMARY KEY,
        chalet_id UUID NOT NULL REFERENCES chalets(id),
        user_id UUID NOT NULL REFERENCES renters(id),
        date TIMESTAMPTZ NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS chalets_owner_id_idx ON chalets (owner_id)",
    "CREATE INDEX IF NOT EXISTS reservations_chalet_id_idx ON reservations (chalet_id)",
];

const CHALET_COLUMNS: &str =
    "id, owner_id, name, location, description, pricing, capacity, amenities, images, created_at, updated_at";

#[derive(FromRow)]
struct ChaletRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    location: String,
    description: Option<String>,
    pricing: f64,
    capacity: i32,
    amenities: Vec<String>,
    images: Json<Vec<ChaletImage>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ChaletRow> for Chalet {
    fn from(row: ChaletRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            location: row.location,
            description: row.description,
            pricing: row.pricing,
            capacity: row.capacity,
            amenities: row.amenities,
            images: row.images.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ReservationRow {
    id: Uuid,
    chalet_id: Uuid,
    user_id: Uuid,
    date: DateTime<Utc>,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            chalet_id: row.chalet_id,
            user_id: row.user_id,
            date: row.date,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ReservationViewRow {
    id: Uuid,
    date: DateTime<Utc>,
    status: String,
    chalet_id: Uuid,
    chalet_name: String,
    chalet_location: String,
    user_id: Uuid,
    user_username: String,
    user_email: String,
}

impl TryFrom<ReservationViewRow> for ReservationView {
    type Error = StoreError;

    fn try_from(row: ReservationViewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            date: row.date,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            chalet: ChaletSummary {
                id: row.chalet_id,
                name: row.chalet_name,
                location: row.chalet_location,
            },
            user: Renter {
                id: row.user_id,
                username: row.user_username,
                email: row.user_email,
            },
        })
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Config("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Applied {} schema statements", MIGRATIONS.len());
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_owner_by_email(&self, email: &str) -> Result<Option<Owner>, StoreError> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, username, email, password_hash, created_at FROM owners WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    async fn find_owner(&self, id: Uuid) -> Result<Option<Owner>, StoreError> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, username, email, password_hash, created_at FROM owners WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, StoreError> {
        let result = sqlx::query_as::<_, Owner>(
            r#"
            INSERT INTO owners (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&owner.username)
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict(format!("email {} already registered", owner.email)))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn owner_chalets(&self, owner_id: Uuid) -> Result<Vec<Chalet>, StoreError> {
        let sql = format!("SELECT {} FROM chalets WHERE owner_id = $1 ORDER BY created_at", CHALET_COLUMNS);
        let rows = sqlx::query_as::<_, ChaletRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Chalet::from).collect())
    }

    async fn reservations_for_chalets(&self, chalet_ids: &[Uuid]) -> Result<Vec<ReservationView>, StoreError> {
        if chalet_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query_as::<_, ReservationViewRow>(
            r#"
            SELECT r.id, r.date, r.status,
                   c.id AS chalet_id, c.name AS chalet_name, c.location AS chalet_location,
                   u.id AS user_id, u.username AS user_username, u.email AS user_email
            FROM reservations r
            JOIN chalets c ON c.id = r.chalet_id
            JOIN renters u ON u.id = r.user_id
            WHERE r.chalet_id = ANY($1)
            ORDER BY r.date ASC
            "#,
        )
        .bind(chalet_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReservationView::try_from).collect()
    }

    async fn find_owned_reservation(
        &self,
        reservation_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT r.id, r.chalet_id, r.user_id, r.date, r.status, r.updated_at
            FROM reservations r
            JOIN chalets c ON c.id = r.chalet_id
            WHERE r.id = $1 AND c.owner_id = $2
            "#,
        )
        .bind(reservation_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Reservation::try_from).transpose()
    }

    async fn save_reservation(&self, reservation: &Reservation) -> Result<Reservation, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            UPDATE reservations SET status = $2, date = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, chalet_id, user_id, date, status, updated_at
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.status.as_str())
        .bind(reservation.date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("reservation {}", reservation.id)))?;

        row.try_into()
    }

    async fn find_owned_chalet(&self, chalet_id: Uuid, owner_id: Uuid) -> Result<Option<Chalet>, StoreError> {
        let sql = format!("SELECT {} FROM chalets WHERE id = $1 AND owner_id = $2", CHALET_COLUMNS);
        let row = sqlx::query_as::<_, ChaletRow>(&sql)
            .bind(chalet_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Chalet::from))
    }

    async fn save_chalet(&self, chalet: &Chalet) -> Result<Chalet, StoreError> {
        let sql = format!(
            r#"
            UPDATE chalets
            SET name = $2, location = $3, description = $4, pricing = $5,
                capacity = $6, amenities = $7, images = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            CHALET_COLUMNS
        );
        let row = sqlx::query_as::<_, ChaletRow>(&sql)
            .bind(chalet.id)
            .bind(&chalet.name)
            .bind(&chalet.location)
            .bind(&chalet.description)
            .bind(chalet.pricing)
            .bind(chalet.capacity)
            .bind(&chalet.amenities)
            .bind(Json(&chalet.images))
            .bind(chalet.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("chalet {}", chalet.id)))?;
        Ok(row.into())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
