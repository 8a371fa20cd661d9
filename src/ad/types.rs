use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::AdModel;

/// Request payload for creating or updating an ad
#[derive(Debug, Clone, Deserialize)]
pub struct AdRequest {
    pub brand: String,
    pub size: String,
    pub price: String,
}

/// Ad representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdResponse {
    pub id: i64,
    pub owner_email: String,
    pub brand: String,
    pub size: String,
    pub price: String,
    pub image_path: Option<String>,
    pub sold: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AdModel> for AdResponse {
    fn from(ad: AdModel) -> Self {
        Self {
            id: ad.id,
            owner_email: ad.owner_email,
            brand: ad.brand,
            size: ad.size,
            price: ad.price,
            image_path: ad.image_path,
            sold: ad.sold,
            created_at: ad.created_at,
        }
    }
}
