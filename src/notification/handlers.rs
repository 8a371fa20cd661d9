use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::{service::NotificationService, types::NotificationResponse};
use crate::session::AuthenticatedAccount;
use crate::shared::{AppError, AppState};

fn notification_service(state: &AppState) -> NotificationService {
    NotificationService::new(Arc::clone(&state.notification_repository))
}

/// GET /api/notifications
///
/// Unread notifications of the caller, newest first
#[instrument(name = "list_notifications", skip_all, fields(email = %account.email))]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    Ok(Json(notification_service(&state).list_unread(&account.email).await?))
}

/// POST /api/notifications/:id/read
#[instrument(name = "mark_notification_read", skip(state, account), fields(email = %account.email))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(id): Path<i64>,
) -> Result<Json<NotificationResponse>, AppError> {
    Ok(Json(
        notification_service(&state)
            .mark_read(&account.email, id)
            .await?,
    ))
}
