use std::sync::Arc;
use tracing::{debug, instrument};

use super::service::SessionTokenStore;
use crate::shared::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolves the calling account from an `Authorization: Bearer <token>` header
#[derive(Clone)]
pub struct AuthService {
    session_store: Arc<SessionTokenStore>,
}

impl AuthService {
    pub fn new(session_store: Arc<SessionTokenStore>) -> Self {
        Self { session_store }
    }

    /// Extracts the token part of a bearer header, if it has one
    pub fn bearer_token(header: Option<&str>) -> Option<&str> {
        let token = header?.trim().strip_prefix(BEARER_PREFIX)?.trim();
        (!token.is_empty()).then_some(token)
    }

    #[instrument(skip_all)]
    pub async fn resolve_account_id_from_bearer_header(
        &self,
        header: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let Some(token) = Self::bearer_token(header) else {
            debug!(header_present = header.is_some(), "No bearer token in request");
            return Ok(None);
        };

        self.session_store.resolve_account_id(token).await
    }

    /// Same as `resolve_account_id_from_bearer_header` but treats absence as 401
    pub async fn require_account_id(&self, header: Option<&str>) -> Result<String, AppError> {
        self.resolve_account_id_from_bearer_header(header)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))
    }
}
