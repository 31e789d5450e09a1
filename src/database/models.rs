use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Owner {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOwner {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A person who books chalets.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Renter {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaletImage {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chalet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub pricing: f64,
    pub capacity: i32,
    pub amenities: Vec<String>,
    pub images: Vec<ChaletImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chalet fields an owner may change. Anything else in an update is refused upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChaletUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub pricing: Option<f64>,
    #[serde(default, deserialize_with = "integral")]
    pub capacity: Option<i32>,
    pub amenities: Option<Vec<String>>,
}

/// Any JSON number with no fractional part, so `3` and `3.0` both read as 3.
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let Some(n) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
        return Err(de::Error::custom(format!("expected a 32-bit integer, found {}", n)));
    }
    Ok(Some(n as i32))
}

impl ChaletUpdate {
    pub const FIELDS: [&'static str; 6] = ["name", "location", "description", "pricing", "capacity", "amenities"];

    pub fn apply(self, chalet: &mut Chalet) {
        if let Some(name) = self.name {
            chalet.name = name;
        }
        if let Some(location) = self.location {
            chalet.location = location;
        }
        if let Some(description) = self.description {
            chalet.description = Some(description);
        }
        if let Some(pricing) = self.pricing {
            chalet.pricing = pricing;
        }
        if let Some(capacity) = self.capacity {
            chalet.capacity = capacity;
        }
        if let Some(amenities) = self.amenities {
            chalet.amenities = amenities;
        }
        chalet.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaletSummary {
    pub id: Uuid,
    pub name: String,
    pub location: String,
}

impl From<&Chalet> for ChaletSummary {
    fn from(chalet: &Chalet) -> Self {
        Self {
            id: chalet.id,
            name: chalet.name.clone(),
            location: chalet.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Accepted => "accepted",
            ReservationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "accepted" => Ok(ReservationStatus::Accepted),
            "rejected" => Ok(ReservationStatus::Rejected),
            other => Err(format!("unknown reservation status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub chalet_id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub updated_at: DateTime<Utc>,
}

/// Reservation with its renter and chalet expanded for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub chalet: ChaletSummary,
    pub user: Renter,
}
