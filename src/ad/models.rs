use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the ads table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct AdModel {
    pub id: i64,
    pub owner_email: String,
    pub brand: String,
    pub size: String,
    pub price: String,             // Decimal string as entered, e.g. "99.99"
    pub image_path: Option<String>, // Hosted image URL
    pub sold: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for an ad that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewAd {
    pub owner_email: String,
    pub brand: String,
    pub size: String,
    pub price: String,
}

impl AdModel {
    /// Ownership is matched on email, ignoring case
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner_email.to_lowercase() == email.to_lowercase()
    }
}
