use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ImageError, ImageStore, ImageUpload};
use crate::config::ImageConfig;
use crate::database::models::ChaletImage;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Signed uploads to a Cloudinary account.
pub struct CloudinaryStore {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl CloudinaryStore {
    pub fn from_config(config: &ImageConfig) -> Option<Self> {
        let (Some(cloud), Some(key), Some(secret)) = (&config.cloud_name, &config.api_key, &config.api_secret) else {
            return None;
        };

        Some(Self {
            client: reqwest::Client::new(),
            upload_url: format!("{}/{}/image/upload", API_BASE, cloud),
            api_key: key.clone(),
            api_secret: secret.clone(),
            folder: config.folder.clone(),
        })
    }

    /// Hex SHA-256 over the alphabetically sorted signed params followed by the secret.
    fn sign(&self, timestamp: i64) -> String {
        let to_sign = format!("folder={}&timestamp={}{}", self.folder, timestamp, self.api_secret);
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, upload: ImageUpload) -> Result<ChaletImage, ImageError> {
        let timestamp = Utc::now().timestamp();

        let mut file = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(content_type) = upload.content_type.as_deref() {
            file = file.mime_str(content_type)?;
        }

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.folder.clone())
            .text("signature", self.sign(timestamp))
            .text("signature_algorithm", "sha256");

        let response = self.client.post(&self.upload_url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Rejected { status: status.as_u16(), body });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::debug!("Uploaded image {}", uploaded.public_id);

        Ok(ChaletImage {
            secure_url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
