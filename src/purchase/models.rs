use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the purchases table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PurchaseModel {
    pub id: i64,
    pub ad_id: i64,
    pub buyer_email: String,
    pub seller_email: String,
    pub price: String, // Price of the ad at checkout time
    pub purchased_at: DateTime<Utc>,
}
