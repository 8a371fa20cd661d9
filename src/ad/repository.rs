use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument, warn};

use super::models::{AdModel, NewAd};
use crate::shared::AppError;

const AD_COLUMNS: &str = "id, owner_email, brand, size, price, image_path, sold, created_at";

/// Trait for ad persistence
#[async_trait]
pub trait AdRepository {
    async fn create_ad(&self, ad: &NewAd) -> Result<AdModel, AppError>;
    async fn get_ad(&self, id: i64) -> Result<Option<AdModel>, AppError>;
    /// Unsold ads, newest first
    async fn list_unsold(&self) -> Result<Vec<AdModel>, AppError>;
    /// All ads of one owner including sold ones, newest first
    async fn list_by_owner(&self, email: &str) -> Result<Vec<AdModel>, AppError>;
    /// Writes brand, size and price of an existing unsold ad.
    /// Conflict if the ad is sold, NotFound if it does not exist.
    async fn update_ad(&self, ad: &AdModel) -> Result<(), AppError>;
    /// Writes only the image path. Returns the updated ad, or `None` if it no longer exists.
    async fn update_image_path(
        &self,
        id: i64,
        image_path: Option<&str>,
    ) -> Result<Option<AdModel>, AppError>;
    /// Deletes an unsold ad. Returns false if it does not exist, Conflict if it is sold.
    async fn delete_ad(&self, id: i64) -> Result<bool, AppError>;
}

fn sold_conflict(action: &str) -> AppError {
    AppError::Conflict(format!("Sold ads cannot be {action}"))
}

#[derive(Default)]
struct AdStore {
    next_id: i64,
    ads: BTreeMap<i64, AdModel>,
}

/// In-memory implementation of AdRepository for development and testing
pub struct InMemoryAdRepository {
    store: Mutex<AdStore>,
}

impl Default for InMemoryAdRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAdRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(AdStore {
                next_id: 1,
                ads: BTreeMap::new(),
            }),
        }
    }

    /// Runs `f` with exclusive access to all ads. Used to make multi-ad
    /// changes atomic in memory.
    pub fn with_ads<R>(&self, f: impl FnOnce(&mut BTreeMap<i64, AdModel>) -> R) -> R {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store.ads)
    }

    pub fn ad_count(&self) -> usize {
        self.with_ads(|ads| ads.len())
    }
}

fn newest_first(mut ads: Vec<AdModel>) -> Vec<AdModel> {
    ads.sort_by(|a, b| b.id.cmp(&a.id));
    ads
}

#[async_trait]
impl AdRepository for InMemoryAdRepository {
    #[instrument(skip(self, ad), fields(owner = %ad.owner_email))]
    async fn create_ad(&self, ad: &NewAd) -> Result<AdModel, AppError> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let id = store.next_id;
        store.next_id += 1;

        let model = AdModel {
            id,
            owner_email: ad.owner_email.clone(),
            brand: ad.brand.clone(),
            size: ad.size.clone(),
            price: ad.price.clone(),
            image_path: None,
            sold: false,
            created_at: Utc::now(),
        };
        store.ads.insert(id, model.clone());

        debug!(ad_id = id, "Ad created in memory");
        Ok(model)
    }

    async fn get_ad(&self, id: i64) -> Result<Option<AdModel>, AppError> {
        Ok(self.with_ads(|ads| ads.get(&id).cloned()))
    }

    async fn list_unsold(&self) -> Result<Vec<AdModel>, AppError> {
        let ads = self.with_ads(|ads| ads.values().filter(|ad| !ad.sold).cloned().collect());
        Ok(newest_first(ads))
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<AdModel>, AppError> {
        let ads = self.with_ads(|ads| {
            ads.values()
                .filter(|ad| ad.is_owned_by(email))
                .cloned()
                .collect()
        });
        Ok(newest_first(ads))
    }

    #[instrument(skip(self, ad), fields(ad_id = ad.id))]
    async fn update_ad(&self, ad: &AdModel) -> Result<(), AppError> {
        self.with_ads(|ads| match ads.get_mut(&ad.id) {
            Some(stored) if stored.sold => {
                warn!("Refusing to update sold ad in memory");
                Err(sold_conflict("changed"))
            }
            Some(stored) => {
                stored.brand = ad.brand.clone();
                stored.size = ad.size.clone();
                stored.price = ad.price.clone();
                debug!("Ad updated in memory");
                Ok(())
            }
            None => {
                warn!("Ad not found for update in memory");
                Err(AppError::NotFound("Ad not found".to_string()))
            }
        })
    }

    #[instrument(skip(self))]
    async fn update_image_path(
        &self,
        id: i64,
        image_path: Option<&str>,
    ) -> Result<Option<AdModel>, AppError> {
        Ok(self.with_ads(|ads| {
            ads.get_mut(&id).map(|stored| {
                stored.image_path = image_path.map(str::to_string);
                stored.clone()
            })
        }))
    }

    #[instrument(skip(self))]
    async fn delete_ad(&self, id: i64) -> Result<bool, AppError> {
        self.with_ads(|ads| match ads.get(&id).map(|stored| stored.sold) {
            Some(true) => {
                warn!("Refusing to delete sold ad in memory");
                Err(sold_conflict("deleted"))
            }
            Some(false) => Ok(ads.remove(&id).is_some()),
            None => Ok(false),
        })
    }
}

/// PostgreSQL implementation of the ad repository
pub struct PostgresAdRepository {
    pool: PgPool,
}

impl PostgresAdRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl AdRepository for PostgresAdRepository {
    #[instrument(skip(self, ad), fields(owner = %ad.owner_email))]
    async fn create_ad(&self, ad: &NewAd) -> Result<AdModel, AppError> {
        let model = sqlx::query_as::<_, AdModel>(&format!(
            "INSERT INTO ads (owner_email, brand, size, price, sold, created_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5) RETURNING {AD_COLUMNS}"
        ))
        .bind(&ad.owner_email)
        .bind(&ad.brand)
        .bind(&ad.size)
        .bind(&ad.price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create ad in database"))?;

        debug!(ad_id = model.id, "Ad created in database");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn get_ad(&self, id: i64) -> Result<Option<AdModel>, AppError> {
        sqlx::query_as::<_, AdModel>(&format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch ad from database"))
    }

    async fn list_unsold(&self) -> Result<Vec<AdModel>, AppError> {
        sqlx::query_as::<_, AdModel>(&format!(
            "SELECT {AD_COLUMNS} FROM ads WHERE sold = FALSE ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list ads from database"))
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<AdModel>, AppError> {
        sqlx::query_as::<_, AdModel>(&format!(
            "SELECT {AD_COLUMNS} FROM ads WHERE lower(owner_email) = lower($1) ORDER BY id DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list owner ads from database"))
    }

    #[instrument(skip(self, ad), fields(ad_id = ad.id))]
    async fn update_ad(&self, ad: &AdModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE ads SET brand = $2, size = $3, price = $4 WHERE id = $1 AND sold = FALSE",
        )
        .bind(ad.id)
        .bind(&ad.brand)
        .bind(&ad.size)
        .bind(&ad.price)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update ad in database"))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: the ad is gone or was sold in the meantime
        match self.get_ad(ad.id).await? {
            Some(_) => {
                warn!("Refusing to update sold ad");
                Err(sold_conflict("changed"))
            }
            None => {
                warn!("Ad not found for update");
                Err(AppError::NotFound("Ad not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn update_image_path(
        &self,
        id: i64,
        image_path: Option<&str>,
    ) -> Result<Option<AdModel>, AppError> {
        sqlx::query_as::<_, AdModel>(&format!(
            "UPDATE ads SET image_path = $2 WHERE id = $1 RETURNING {AD_COLUMNS}"
        ))
        .bind(id)
        .bind(image_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update ad image in database"))
    }

    #[instrument(skip(self))]
    async fn delete_ad(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1 AND sold = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete ad from database"))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.get_ad(id).await? {
            Some(_) => {
                warn!("Refusing to delete sold ad");
                Err(sold_conflict("deleted"))
            }
            None => Ok(false),
        }
    }
}
