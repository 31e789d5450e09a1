pub mod cloudinary;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use cloudinary::CloudinaryStore;

use crate::config::ImageConfig;
use crate::database::models::ChaletImage;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image uploads are not configured")]
    NotConfigured,

    #[error("upload rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A file received from the client, ready to relay.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Object storage for chalet pictures.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store one image and return its public URL and id.
    async fn upload(&self, upload: ImageUpload) -> Result<ChaletImage, ImageError>;
}

/// Refuses every upload; used when no object store credentials are set.
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn upload(&self, _upload: ImageUpload) -> Result<ChaletImage, ImageError> {
        Err(ImageError::NotConfigured)
    }
}

pub fn image_store(config: &ImageConfig) -> Arc<dyn ImageStore> {
    match CloudinaryStore::from_config(config) {
        Some(store) => Arc::new(store),
        None => {
            tracing::warn!("Cloudinary credentials not set; image uploads are disabled");
            Arc::new(DisabledImageStore)
        }
    }
}
