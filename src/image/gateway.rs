use std::sync::Arc;
use tracing::{info, instrument};

use super::extension::ImageExtension;
use super::uploader::{ImageUpload, ImageUploader};
use crate::ad::models::AdModel;
use crate::ad::repository::AdRepository;
use crate::ad::service::AdService;
use crate::ad::types::AdResponse;
use crate::session::AuthService;
use crate::shared::{AppError, AppState};

/// Attaches hosted pictures to ads on behalf of their owners
pub struct AdImageGateway {
    auth: AuthService,
    ads: Arc<dyn AdRepository + Send + Sync>,
    uploader: Arc<dyn ImageUploader>,
}

impl AdImageGateway {
    pub fn new(
        auth: AuthService,
        ads: Arc<dyn AdRepository + Send + Sync>,
        uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        Self { auth, ads, uploader }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.auth_service.clone(),
            Arc::clone(&state.ad_repository),
            Arc::clone(&state.image_uploader),
        )
    }

    /// Resolves the caller and checks they own the ad.
    /// Fails with Unauthorized, then NotFound, then Forbidden.
    pub async fn authorize(&self, ad_id: i64, bearer_header: Option<&str>) -> Result<AdModel, AppError> {
        let email = self.auth.require_account_id(bearer_header).await?;
        AdService::new(Arc::clone(&self.ads))
            .load_owned_ad(&email, ad_id)
            .await
    }

    /// Validates and uploads `file`, then stores its URL on an already authorized ad.
    /// Nothing is written unless the image host confirmed the upload.
    #[instrument(skip(self, ad, file), fields(ad_id = ad.id))]
    pub async fn attach_authorized(
        &self,
        ad: &AdModel,
        file: Option<ImageUpload>,
    ) -> Result<AdResponse, AppError> {
        let file = file
            .filter(|f| !f.bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("No file".to_string()))?;
        let extension = ImageExtension::from_filename(file.filename.as_deref())?;

        let url = self.uploader.upload(file).await?;
        let updated = self.store_image_path(ad.id, Some(&url)).await?;

        info!(%extension, url = %url, "Image attached to ad");
        Ok(updated.into())
    }

    /// Full attach flow for callers that already hold the file
    pub async fn attach_image(
        &self,
        ad_id: i64,
        bearer_header: Option<&str>,
        file: Option<ImageUpload>,
    ) -> Result<AdResponse, AppError> {
        let ad = self.authorize(ad_id, bearer_header).await?;
        self.attach_authorized(&ad, file).await
    }

    #[instrument(skip(self, bearer_header))]
    pub async fn detach_image(
        &self,
        ad_id: i64,
        bearer_header: Option<&str>,
    ) -> Result<AdResponse, AppError> {
        let ad = self.authorize(ad_id, bearer_header).await?;
        let updated = self.store_image_path(ad.id, None).await?;

        info!("Image removed from ad");
        Ok(updated.into())
    }

    async fn store_image_path(&self, ad_id: i64, url: Option<&str>) -> Result<AdModel, AppError> {
        self.ads
            .update_image_path(ad_id, url)
            .await?
            .ok_or_else(|| AppError::NotFound("Ad not found".to_string()))
    }
}
