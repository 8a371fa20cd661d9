use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::NotificationModel;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(notification: NotificationModel) -> Self {
        Self {
            id: notification.id,
            message: notification.message,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
