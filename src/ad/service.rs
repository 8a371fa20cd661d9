use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{AdModel, NewAd},
    repository::AdRepository,
    types::{AdRequest, AdResponse},
};
use crate::shared::AppError;

/// Service for ad listing business logic
pub struct AdService {
    repository: Arc<dyn AdRepository + Send + Sync>,
}

impl AdService {
    pub fn new(repository: Arc<dyn AdRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request))]
    pub async fn create_ad(&self, owner_email: &str, request: AdRequest) -> Result<AdResponse, AppError> {
        let request = validate_ad_request(request)?;

        let ad = self
            .repository
            .create_ad(&NewAd {
                owner_email: owner_email.to_string(),
                brand: request.brand,
                size: request.size,
                price: request.price,
            })
            .await?;

        info!(ad_id = ad.id, "Ad created");
        Ok(ad.into())
    }

    pub async fn list_ads(&self) -> Result<Vec<AdResponse>, AppError> {
        let ads = self.repository.list_unsold().await?;
        Ok(ads.into_iter().map(AdResponse::from).collect())
    }

    pub async fn list_own_ads(&self, owner_email: &str) -> Result<Vec<AdResponse>, AppError> {
        let ads = self.repository.list_by_owner(owner_email).await?;
        Ok(ads.into_iter().map(AdResponse::from).collect())
    }

    pub async fn get_ad(&self, id: i64) -> Result<AdResponse, AppError> {
        self.find_ad(id).await.map(AdResponse::from)
    }

    #[instrument(skip(self, request))]
    pub async fn update_ad(
        &self,
        email: &str,
        id: i64,
        request: AdRequest,
    ) -> Result<AdResponse, AppError> {
        let request = validate_ad_request(request)?;
        let mut ad = self.load_owned_ad(email, id).await?;

        if ad.sold {
            return Err(AppError::Conflict("Sold ads cannot be changed".to_string()));
        }

        ad.brand = request.brand;
        ad.size = request.size;
        ad.price = request.price;
        self.repository.update_ad(&ad).await?;

        info!(ad_id = id, "Ad updated");
        Ok(ad.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_ad(&self, email: &str, id: i64) -> Result<(), AppError> {
        let ad = self.load_owned_ad(email, id).await?;

        if ad.sold {
            return Err(AppError::Conflict("Sold ads cannot be deleted".to_string()));
        }

        self.repository.delete_ad(id).await?;
        info!(ad_id = id, "Ad deleted");
        Ok(())
    }

    /// Loads an ad and checks that `email` owns it (case-insensitive)
    pub async fn load_owned_ad(&self, email: &str, id: i64) -> Result<AdModel, AppError> {
        let ad = self.find_ad(id).await?;

        if !ad.is_owned_by(email) {
            warn!(ad_id = id, email = %email, owner = %ad.owner_email, "Ownership check failed");
            return Err(AppError::Forbidden("Not allowed".to_string()));
        }
        Ok(ad)
    }

    async fn find_ad(&self, id: i64) -> Result<AdModel, AppError> {
        self.repository
            .get_ad(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ad not found".to_string()))
    }
}

/// Trims the fields and checks that the price is a non-negative number
fn validate_ad_request(request: AdRequest) -> Result<AdRequest, AppError> {
    let brand = request.brand.trim().to_string();
    let size = request.size.trim().to_string();
    let price = request.price.trim().to_string();

    if brand.is_empty() || size.is_empty() {
        return Err(AppError::BadRequest("Brand and size are required".to_string()));
    }

    match price.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => {}
        _ => return Err(AppError::BadRequest("Price must be a non-negative number".to_string())),
    }

    Ok(AdRequest { brand, size, price })
}
