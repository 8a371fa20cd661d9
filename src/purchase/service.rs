use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    repository::PurchaseRepository,
    types::{CheckoutResponse, PurchaseResponse},
};
use crate::shared::AppError;

/// Service for buying ads
pub struct PurchaseService {
    repository: Arc<dyn PurchaseRepository + Send + Sync>,
}

impl PurchaseService {
    pub fn new(repository: Arc<dyn PurchaseRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Buys the given ads. Duplicate ids are bought once, in first-seen order.
    #[instrument(skip(self, ad_ids), fields(requested = ad_ids.len()))]
    pub async fn checkout(&self, buyer_email: &str, ad_ids: Vec<i64>) -> Result<CheckoutResponse, AppError> {
        let mut unique = Vec::with_capacity(ad_ids.len());
        for id in ad_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        if unique.is_empty() {
            return Err(AppError::BadRequest("No ads selected".to_string()));
        }

        let purchases = self.repository.checkout(buyer_email, &unique).await?;
        info!(purchase_count = purchases.len(), "Checkout completed");

        Ok(CheckoutResponse {
            purchases: purchases.into_iter().map(PurchaseResponse::from).collect(),
        })
    }

    pub async fn list_purchases(&self, buyer_email: &str) -> Result<Vec<PurchaseResponse>, AppError> {
        let purchases = self.repository.list_by_buyer(buyer_email).await?;
        Ok(purchases.into_iter().map(PurchaseResponse::from).collect())
    }
}
