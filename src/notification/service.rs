use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{repository::NotificationRepository, types::NotificationResponse};
use crate::shared::AppError;

/// Service for reading and acknowledging notifications
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository + Send + Sync>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn list_unread(&self, email: &str) -> Result<Vec<NotificationResponse>, AppError> {
        let notifications = self.repository.list_unread(email).await?;
        Ok(notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect())
    }

    /// Marks one of the caller's notifications read. Marking twice is fine.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, email: &str, id: i64) -> Result<NotificationResponse, AppError> {
        let mut notification = self
            .repository
            .get_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.recipient_email.to_lowercase() != email.to_lowercase() {
            warn!(recipient = %notification.recipient_email, "Notification belongs to another account");
            return Err(AppError::Forbidden("Not allowed".to_string()));
        }

        if !notification.read {
            self.repository.mark_read(id).await?;
            notification.read = true;
            debug!("Notification marked read");
        }

        Ok(notification.into())
    }
}
