use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument, warn};

use super::models::AccountModel;
use crate::shared::AppError;

/// Trait for account persistence. Emails are unique case-insensitively.
#[async_trait]
pub trait AccountRepository {
    async fn create_account(&self, account: &AccountModel) -> Result<(), AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AppError>;
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// In-memory implementation of AccountRepository for development and testing
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<String, AccountModel>>, // keyed by lowercased email
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    #[instrument(skip(self, account), fields(email = %account.email))]
    async fn create_account(&self, account: &AccountModel) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let key = email_key(&account.email);

        if accounts.contains_key(&key) {
            debug!("Account already exists in memory");
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        accounts.insert(key, account.clone());

        debug!("Account created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AppError> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.get(&email_key(email)).cloned())
    }
}

/// PostgreSQL implementation of the account repository
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip(self, account), fields(email = %account.email))]
    async fn create_account(&self, account: &AccountModel) -> Result<(), AppError> {
        sqlx::query("INSERT INTO accounts (email, password_hash, created_at) VALUES ($1, $2, $3)")
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    debug!("Account already exists in database");
                    AppError::Conflict("Email is already registered".to_string())
                }
                e => {
                    warn!(error = %e, "Failed to create account in database");
                    AppError::DatabaseError(e.to_string())
                }
            })?;

        debug!("Account created in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AppError> {
        sqlx::query_as::<_, AccountModel>(
            "SELECT email, password_hash, created_at FROM accounts WHERE lower(email) = $1",
        )
        .bind(email_key(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch account from database");
            AppError::DatabaseError(e.to_string())
        })
    }
}
