pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::sync::Arc;
use tracing::info;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Store, StoreError};

use crate::config::{AppConfig, StoreBackend};

/// Open the store selected by configuration.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            if let Some(seed) = &config.database.seed {
                store.seed_from_file(seed, config.security.bcrypt_cost).await?;
            }
            info!("Using in-memory store; data is not persisted");
            Ok(Arc::new(store))
        }
    }
}
