use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::account::repository::AccountRepository;
use crate::ad::repository::AdRepository;
use crate::image::uploader::ImageUploader;
use crate::notification::repository::NotificationRepository;
use crate::purchase::repository::PurchaseRepository;
use crate::session::{AuthService, SessionTokenStore};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub account_repository: Arc<dyn AccountRepository + Send + Sync>,
    pub ad_repository: Arc<dyn AdRepository + Send + Sync>,
    pub purchase_repository: Arc<dyn PurchaseRepository + Send + Sync>,
    pub notification_repository: Arc<dyn NotificationRepository + Send + Sync>,
    pub session_store: Arc<SessionTokenStore>,
    pub auth_service: AuthService,
    pub image_uploader: Arc<dyn ImageUploader>,
}

impl AppState {
    pub fn new(
        account_repository: Arc<dyn AccountRepository + Send + Sync>,
        ad_repository: Arc<dyn AdRepository + Send + Sync>,
        purchase_repository: Arc<dyn PurchaseRepository + Send + Sync>,
        notification_repository: Arc<dyn NotificationRepository + Send + Sync>,
        session_store: Arc<SessionTokenStore>,
        image_uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        let auth_service = AuthService::new(Arc::clone(&session_store));

        Self {
            account_repository,
            ad_repository,
            purchase_repository,
            notification_repository,
            session_store,
            auth_service,
            image_uploader,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or blank operator configuration. The message is returned to the client.
    #[error("{0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Configuration(_)
            | AppError::Upstream(_)
            | AppError::DatabaseError(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to API clients
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Configuration(msg) => msg.clone(),
            AppError::Upstream(_) => "Image upload failed".to_string(),
            AppError::DatabaseError(_) | AppError::Internal => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed with server error");
        }

        let body = Json(json!({
            "error": self.public_message()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
