use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ad::models::AdModel;

/// Database model for the notifications table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct NotificationModel {
    pub id: i64,
    pub recipient_email: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Text sent to the seller when one of their ads is bought
pub fn sale_message(ad: &AdModel) -> String {
    format!(
        "Your ad \"{} (size {})\" was sold for {}",
        ad.brand, ad.size, ad.price
    )
}
