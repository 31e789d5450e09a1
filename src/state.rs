use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::images::ImageStore;

/// Shared, read-only application context handed to every gate and handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            images,
        }
    }

    /// Whether 500 responses may carry failure details.
    pub fn expose_error_details(&self) -> bool {
        self.config.security.expose_error_details
    }
}
