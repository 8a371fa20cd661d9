use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

use super::models::PurchaseModel;
use crate::ad::models::AdModel;
use crate::ad::repository::InMemoryAdRepository;
use crate::notification::models::sale_message;
use crate::notification::repository::{InMemoryNotificationRepository, NotificationRepository};
use crate::shared::AppError;

/// Trait for purchase persistence
#[async_trait]
pub trait PurchaseRepository {
    /// Buys every ad in `ad_ids` for `buyer_email`, or none of them.
    /// Marks the ads sold, records one purchase per ad and notifies each seller.
    async fn checkout(&self, buyer_email: &str, ad_ids: &[i64]) -> Result<Vec<PurchaseModel>, AppError>;
    /// Purchases of one buyer, newest first
    async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<PurchaseModel>, AppError>;
}

/// Rejects ads that are missing, already sold or owned by the buyer
fn ensure_purchasable(buyer_email: &str, ad_id: i64, ad: Option<&AdModel>) -> Result<(), AppError> {
    let Some(ad) = ad else {
        return Err(AppError::NotFound(format!("Ad {ad_id} not found")));
    };
    if ad.sold {
        return Err(AppError::Conflict(format!("Ad {ad_id} is already sold")));
    }
    if ad.is_owned_by(buyer_email) {
        return Err(AppError::BadRequest("You cannot buy your own ad".to_string()));
    }
    Ok(())
}

struct PurchaseStore {
    next_id: i64,
    purchases: Vec<PurchaseModel>,
}

/// In-memory implementation of PurchaseRepository for development and testing.
/// Shares the ad and notification repositories so checkout can touch all three.
pub struct InMemoryPurchaseRepository {
    ads: Arc<InMemoryAdRepository>,
    notifications: Arc<InMemoryNotificationRepository>,
    store: Mutex<PurchaseStore>,
}

impl InMemoryPurchaseRepository {
    pub fn new(
        ads: Arc<InMemoryAdRepository>,
        notifications: Arc<InMemoryNotificationRepository>,
    ) -> Self {
        Self {
            ads,
            notifications,
            store: Mutex::new(PurchaseStore {
                next_id: 1,
                purchases: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    #[instrument(skip(self))]
    async fn checkout(&self, buyer_email: &str, ad_ids: &[i64]) -> Result<Vec<PurchaseModel>, AppError> {
        // Validate everything before the first write
        let sold_ads = self.ads.with_ads(|ads| {
            for id in ad_ids {
                ensure_purchasable(buyer_email, *id, ads.get(id))?;
            }

            let mut sold = Vec::with_capacity(ad_ids.len());
            for id in ad_ids {
                if let Some(ad) = ads.get_mut(id) {
                    ad.sold = true;
                    sold.push(ad.clone());
                }
            }
            Ok::<_, AppError>(sold)
        })?;

        let purchases: Vec<PurchaseModel> = {
            let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Utc::now();
            sold_ads
                .iter()
                .map(|ad| {
                    let purchase = PurchaseModel {
                        id: store.next_id,
                        ad_id: ad.id,
                        buyer_email: buyer_email.to_string(),
                        seller_email: ad.owner_email.clone(),
                        price: ad.price.clone(),
                        purchased_at: now,
                    };
                    store.next_id += 1;
                    store.purchases.push(purchase.clone());
                    purchase
                })
                .collect()
        };

        for ad in &sold_ads {
            self.notifications
                .create_notification(&ad.owner_email, &sale_message(ad))
                .await?;
        }

        debug!(purchase_count = purchases.len(), "Checkout stored in memory");
        Ok(purchases)
    }

    async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<PurchaseModel>, AppError> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let buyer = buyer_email.to_lowercase();

        Ok(store
            .purchases
            .iter()
            .rev()
            .filter(|p| p.buyer_email.to_lowercase() == buyer)
            .cloned()
            .collect())
    }
}

/// PostgreSQL implementation of the purchase repository
pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::DatabaseError(e.to_string())
    }
}

const PURCHASE_COLUMNS: &str = "id, ad_id, buyer_email, seller_email, price, purchased_at";

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    #[instrument(skip(self))]
    async fn checkout(&self, buyer_email: &str, ad_ids: &[i64]) -> Result<Vec<PurchaseModel>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start checkout transaction"))?;

        // Row locks keep concurrent checkouts of the same ad apart
        let mut ads = Vec::with_capacity(ad_ids.len());
        for id in ad_ids {
            let ad = sqlx::query_as::<_, AdModel>(
                "SELECT id, owner_email, brand, size, price, image_path, sold, created_at \
                 FROM ads WHERE id = $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock ad for checkout"))?;

            ensure_purchasable(buyer_email, *id, ad.as_ref())?;
            if let Some(ad) = ad {
                ads.push(ad);
            }
        }

        let now = Utc::now();
        let mut purchases = Vec::with_capacity(ads.len());
        for ad in &ads {
            sqlx::query("UPDATE ads SET sold = TRUE WHERE id = $1")
                .bind(ad.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to mark ad sold"))?;

            let purchase = sqlx::query_as::<_, PurchaseModel>(&format!(
                "INSERT INTO purchases (ad_id, buyer_email, seller_email, price, purchased_at) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {PURCHASE_COLUMNS}"
            ))
            .bind(ad.id)
            .bind(buyer_email)
            .bind(&ad.owner_email)
            .bind(&ad.price)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to insert purchase"))?;

            sqlx::query(
                "INSERT INTO notifications (recipient_email, message, read, created_at) \
                 VALUES ($1, $2, FALSE, $3)",
            )
            .bind(&ad.owner_email)
            .bind(sale_message(ad))
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to insert sale notification"))?;

            purchases.push(purchase);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit checkout transaction"))?;

        info!(purchase_count = purchases.len(), "Checkout committed");
        Ok(purchases)
    }

    async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<PurchaseModel>, AppError> {
        sqlx::query_as::<_, PurchaseModel>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE lower(buyer_email) = lower($1) ORDER BY id DESC"
        ))
        .bind(buyer_email)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list purchases"))
    }
}
