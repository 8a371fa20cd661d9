use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::AccountModel,
    password::{hash_password, verify_password},
    repository::AccountRepository,
    types::CredentialsRequest,
};
use crate::session::SessionTokenStore;
use crate::shared::AppError;

/// Service for registration, login and logout
pub struct AccountService {
    repository: Arc<dyn AccountRepository + Send + Sync>,
    session_store: Arc<SessionTokenStore>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepository + Send + Sync>,
        session_store: Arc<SessionTokenStore>,
    ) -> Self {
        Self {
            repository,
            session_store,
        }
    }

    /// Creates the account and returns a session token for it
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: CredentialsRequest) -> Result<String, AppError> {
        let email = request.email.trim().to_string();
        validate_credentials(&email, &request.password)?;

        let password_hash = hash_password(request.password).await?;
        let account = AccountModel::new(email, password_hash);
        self.repository.create_account(&account).await?;
        info!("Account registered");

        self.session_store.issue_token(&account.email).await
    }

    /// Verifies the credentials and returns a fresh session token
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: CredentialsRequest) -> Result<String, AppError> {
        let invalid = || AppError::Unauthorized("Wrong email or password".to_string());

        let Some(account) = self.repository.find_by_email(&request.email).await? else {
            warn!("Login for unknown email");
            return Err(invalid());
        };

        if !verify_password(request.password, account.password_hash.clone()).await? {
            warn!("Login with wrong password");
            return Err(invalid());
        }

        info!("Login successful");
        self.session_store.issue_token(&account.email).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.session_store.revoke_token(token).await
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".to_string()));
    }
    Ok(())
}
