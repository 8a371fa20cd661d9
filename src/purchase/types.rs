use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::PurchaseModel;

/// Request payload for buying the ads in a cart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub ad_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: i64,
    pub ad_id: i64,
    pub buyer_email: String,
    pub seller_email: String,
    pub price: String,
    pub purchased_at: DateTime<Utc>,
}

impl From<PurchaseModel> for PurchaseResponse {
    fn from(purchase: PurchaseModel) -> Self {
        Self {
            id: purchase.id,
            ad_id: purchase.ad_id,
            buyer_email: purchase.buyer_email,
            seller_email: purchase.seller_email,
            price: purchase.price,
            purchased_at: purchase.purchased_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub purchases: Vec<PurchaseResponse>,
}
