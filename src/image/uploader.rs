use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{AppConfig, CloudinaryConfig, UploadPolicy};
use crate::shared::AppError;

pub const DEFAULT_FILENAME: &str = "upload.jpg";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from a client, ready to be forwarded to the image host
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    pub fn filename_or_default(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_FILENAME)
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Stores an image somewhere public and returns its URL
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String, AppError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Unsigned uploads to the Cloudinary image API
pub struct CloudinaryUploader {
    client: Client,
    config: CloudinaryConfig,
    max_retries: u32,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig, policy: UploadPolicy) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client could not be built: {e}")))?;

        Ok(Self {
            client,
            config,
            max_retries: policy.max_retries,
        })
    }

    /// The preset goes first, then the file
    fn build_form(&self, image: &ImageUpload) -> Form {
        let file_part = Part::bytes(image.bytes.clone())
            .file_name(image.filename_or_default().to_string())
            .mime_str(image.content_type_or_default())
            .unwrap_or_else(|e| {
                debug!(error = %e, "Unparseable content type, sending as octet-stream");
                Part::bytes(image.bytes.clone())
                    .file_name(image.filename_or_default().to_string())
            });

        Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .part("file", file_part)
    }

    async fn send_once(&self, image: &ImageUpload) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(self.config.upload_url())
            .multipart(self.build_form(image))
            .send()
            .await
    }
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    #[instrument(skip_all, fields(bytes = image.bytes.len(), cloud = %self.config.cloud_name))]
    async fn upload(&self, image: ImageUpload) -> Result<String, AppError> {
        let mut attempt = 0;
        let response = loop {
            match self.send_once(&image).await {
                Ok(response) => break response,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Image upload transport failure, retrying");
                }
                Err(e) => {
                    warn!(error = %e, "Image upload transport failure");
                    return Err(AppError::Upstream(format!("request failed: {e}")));
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Image host rejected upload");
            return Err(AppError::Upstream(format!("image host answered {status}")));
        }

        let parsed: UploadResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Image host returned an unreadable body");
            AppError::Upstream(format!("unreadable response: {e}"))
        })?;

        match parsed.secure_url.map(|url| url.trim().to_string()) {
            Some(url) if !url.is_empty() => {
                info!(url = %url, "Image uploaded");
                Ok(url)
            }
            _ => {
                warn!("Image host response has no secure_url");
                Err(AppError::Upstream("secure_url missing in response".to_string()))
            }
        }
    }
}

/// Installed when the image host is not configured. Every upload fails with
/// the configuration diagnostic and nothing is sent.
pub struct DisabledUploader {
    reason: String,
}

impl DisabledUploader {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ImageUploader for DisabledUploader {
    async fn upload(&self, _image: ImageUpload) -> Result<String, AppError> {
        warn!(reason = %self.reason, "Image upload attempted without image host configuration");
        Err(AppError::Configuration(self.reason.clone()))
    }
}

/// Picks the uploader for the process from the start-up configuration
pub fn uploader_from_config(config: &AppConfig) -> Arc<dyn ImageUploader> {
    let uploader = config
        .cloudinary
        .validate()
        .and_then(|cloudinary| CloudinaryUploader::new(cloudinary, config.upload_policy));

    match uploader {
        Ok(uploader) => {
            info!(url = %uploader.config.upload_url(), "Image uploads enabled");
            Arc::new(uploader)
        }
        Err(e) => {
            let reason = e.public_message();
            warn!(reason = %reason, "Image uploads disabled");
            Arc::new(DisabledUploader::new(reason))
        }
    }
}
