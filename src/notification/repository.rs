use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument, warn};

use super::models::NotificationModel;
use crate::shared::AppError;

/// Trait for notification persistence
#[async_trait]
pub trait NotificationRepository {
    async fn create_notification(
        &self,
        recipient_email: &str,
        message: &str,
    ) -> Result<NotificationModel, AppError>;
    async fn get_notification(&self, id: i64) -> Result<Option<NotificationModel>, AppError>;
    /// Unread notifications of one recipient, newest first
    async fn list_unread(&self, recipient_email: &str) -> Result<Vec<NotificationModel>, AppError>;
    async fn mark_read(&self, id: i64) -> Result<(), AppError>;
}

#[derive(Default)]
struct NotificationStore {
    next_id: i64,
    items: BTreeMap<i64, NotificationModel>,
}

/// In-memory implementation of NotificationRepository for development and testing
pub struct InMemoryNotificationRepository {
    store: Mutex<NotificationStore>,
}

impl Default for InMemoryNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(NotificationStore {
                next_id: 1,
                items: BTreeMap::new(),
            }),
        }
    }

    pub fn notification_count(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    #[instrument(skip(self, message))]
    async fn create_notification(
        &self,
        recipient_email: &str,
        message: &str,
    ) -> Result<NotificationModel, AppError> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let id = store.next_id;
        store.next_id += 1;

        let notification = NotificationModel {
            id,
            recipient_email: recipient_email.to_string(),
            message: message.to_string(),
            read: false,
            created_at: Utc::now(),
        };
        store.items.insert(id, notification.clone());

        debug!(notification_id = id, "Notification created in memory");
        Ok(notification)
    }

    async fn get_notification(&self, id: i64) -> Result<Option<NotificationModel>, AppError> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(store.items.get(&id).cloned())
    }

    async fn list_unread(&self, recipient_email: &str) -> Result<Vec<NotificationModel>, AppError> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let recipient = recipient_email.to_lowercase();

        Ok(store
            .items
            .values()
            .rev()
            .filter(|n| !n.read && n.recipient_email.to_lowercase() == recipient)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: i64) -> Result<(), AppError> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match store.items.get_mut(&id) {
            Some(notification) => {
                notification.read = true;
                Ok(())
            }
            None => Err(AppError::NotFound("Notification not found".to_string())),
        }
    }
}

/// PostgreSQL implementation of the notification repository
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[instrument(skip(self, message))]
    async fn create_notification(
        &self,
        recipient_email: &str,
        message: &str,
    ) -> Result<NotificationModel, AppError> {
        sqlx::query_as::<_, NotificationModel>(
            "INSERT INTO notifications (recipient_email, message, read, created_at) \
             VALUES ($1, $2, FALSE, $3) \
             RETURNING id, recipient_email, message, read, created_at",
        )
        .bind(recipient_email)
        .bind(message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create notification in database");
            AppError::DatabaseError(e.to_string())
        })
    }

    async fn get_notification(&self, id: i64) -> Result<Option<NotificationModel>, AppError> {
        sqlx::query_as::<_, NotificationModel>(
            "SELECT id, recipient_email, message, read, created_at FROM notifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, notification_id = id, "Failed to fetch notification from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    async fn list_unread(&self, recipient_email: &str) -> Result<Vec<NotificationModel>, AppError> {
        sqlx::query_as::<_, NotificationModel>(
            "SELECT id, recipient_email, message, read, created_at FROM notifications \
             WHERE lower(recipient_email) = lower($1) AND read = FALSE ORDER BY id DESC",
        )
        .bind(recipient_email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list notifications from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to mark notification read in database");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }
}
