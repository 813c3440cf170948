//! Image upload passthrough.
//!
//! Event banners are handed to an [`AssetHost`] and only the resulting public
//! URL is stored with the event.

use crate::config::{AssetBackend, CloudinaryConfig, Config};
use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use ulid::Ulid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image file is empty")]
    Empty,
    #[error("upload request failed: {message}")]
    Request { message: String },
    #[error("asset host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("failed to store image: {message}")]
    Io { message: String },
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// File extension taken from the file name, falling back to the declared
    /// content type.
    pub fn extension(&self) -> String {
        let from_name = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|ch| ch.is_ascii_alphanumeric()));
        if let Some(ext) = from_name {
            return ext.to_ascii_lowercase();
        }
        self.content_type
            .as_deref()
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.first())
            .map_or_else(|| "bin".to_string(), |ext| (*ext).to_string())
    }
}

pub trait AssetHost: Send + Sync {
    /// Stores the image and returns the URL it is served from.
    fn upload(&self, image: ImageUpload) -> BoxFuture<'_, Result<String, UploadError>>;
}

pub fn from_config(config: &Config) -> Result<Arc<dyn AssetHost>, UploadError> {
    match config.assets {
        AssetBackend::Local => Ok(Arc::new(LocalAssetHost::new(config.upload_dir.clone()))),
        AssetBackend::Cloudinary => Ok(Arc::new(CloudinaryHost::new(config.cloudinary.clone())?)),
    }
}

/// Writes uploads into a directory served under `/uploads`.
pub struct LocalAssetHost {
    dir: PathBuf,
}

impl LocalAssetHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AssetHost for LocalAssetHost {
    fn upload(&self, image: ImageUpload) -> BoxFuture<'_, Result<String, UploadError>> {
        async move {
            if image.bytes.is_empty() {
                return Err(UploadError::Empty);
            }
            let file_name = format!("{}.{}", Ulid::new().to_string().to_lowercase(), image.extension());
            let io_error = |err: std::io::Error| UploadError::Io {
                message: err.to_string(),
            };
            tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
            tokio::fs::write(self.dir.join(&file_name), &image.bytes)
                .await
                .map_err(io_error)?;
            info!(file = %file_name, bytes = image.bytes.len(), "stored image locally");
            Ok(format!("/uploads/{file_name}"))
        }
        .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

/// Signed uploads to the Cloudinary image API.
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
    endpoint: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self, UploadError> {
        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );
        Self::with_endpoint(config, endpoint)
    }

    pub fn with_endpoint(
        config: CloudinaryConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("evhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| UploadError::Request {
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            config,
            endpoint: endpoint.into(),
        })
    }

    async fn send(&self, image: ImageUpload) -> Result<String, UploadError> {
        if image.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let mut part = reqwest::multipart::Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|err| UploadError::Request {
                    message: err.to_string(),
                })?;
        }
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        debug!(endpoint = %self.endpoint, folder = %self.config.folder, "uploading image");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Request {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<CloudinaryErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let body: CloudinaryResponse =
            response.json().await.map_err(|err| UploadError::Request {
                message: err.to_string(),
            })?;
        info!(url = %body.secure_url, "uploaded image");
        Ok(body.secure_url)
    }
}

impl AssetHost for CloudinaryHost {
    fn upload(&self, image: ImageUpload) -> BoxFuture<'_, Result<String, UploadError>> {
        self.send(image).boxed()
    }
}

/// Cloudinary request signature: the parameters sorted by name, joined as
/// `k=v&k=v`, with the API secret appended, hashed with SHA-256.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
