use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument, warn};

use super::models::SessionTokenModel;
use super::token_prefix;
use crate::shared::AppError;

/// Trait for session token persistence, keyed by the token value
#[async_trait]
pub trait SessionTokenRepository {
    async fn insert_token(&self, token: &SessionTokenModel) -> Result<(), AppError>;
    async fn find_token(&self, token: &str) -> Result<Option<SessionTokenModel>, AppError>;
    /// Deletes the record if present. Returns whether a record was removed;
    /// deleting an absent token is not an error.
    async fn delete_token(&self, token: &str) -> Result<bool, AppError>;
}

/// In-memory implementation of SessionTokenRepository for development and testing
///
/// Data is kept in a map guarded by a mutex and is lost when the process exits.
pub struct InMemorySessionTokenRepository {
    tokens: Mutex<HashMap<String, SessionTokenModel>>,
}

impl Default for InMemorySessionTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a repository with pre-populated tokens
    pub fn with_tokens(tokens: Vec<SessionTokenModel>) -> Self {
        let token_map = tokens
            .into_iter()
            .map(|token| (token.token.clone(), token))
            .collect();

        Self {
            tokens: Mutex::new(token_map),
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Direct storage lookup that bypasses expiry handling
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }
}

#[async_trait]
impl SessionTokenRepository for InMemorySessionTokenRepository {
    #[instrument(skip_all)]
    async fn insert_token(&self, token: &SessionTokenModel) -> Result<(), AppError> {
        debug!(token = %token_prefix(&token.token), email = %token.email, "Storing session token in memory");

        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        if tokens.contains_key(&token.token) {
            warn!(token = %token_prefix(&token.token), "Session token already exists in memory");
            return Err(AppError::DatabaseError(
                "Session token already exists".to_string(),
            ));
        }
        tokens.insert(token.token.clone(), token.clone());

        Ok(())
    }

    #[instrument(skip_all)]
    async fn find_token(&self, token: &str) -> Result<Option<SessionTokenModel>, AppError> {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        let found = tokens.get(token).cloned();

        debug!(
            token = %token_prefix(token),
            found = found.is_some(),
            "Looked up session token in memory"
        );
        Ok(found)
    }

    #[instrument(skip_all)]
    async fn delete_token(&self, token: &str) -> Result<bool, AppError> {
        let removed = self
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some();

        debug!(token = %token_prefix(token), removed, "Deleted session token from memory");
        Ok(removed)
    }
}

/// PostgreSQL implementation of the session token repository
pub struct PostgresSessionTokenRepository {
    pool: PgPool,
}

impl PostgresSessionTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionTokenRepository for PostgresSessionTokenRepository {
    #[instrument(skip_all)]
    async fn insert_token(&self, token: &SessionTokenModel) -> Result<(), AppError> {
        debug!(token = %token_prefix(&token.token), email = %token.email, "Storing session token in database");

        sqlx::query(
            "INSERT INTO session_tokens (token, email, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to store session token in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip_all)]
    async fn find_token(&self, token: &str) -> Result<Option<SessionTokenModel>, AppError> {
        let row = sqlx::query(
            "SELECT token, email, created_at, expires_at FROM session_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, token = %token_prefix(token), "Failed to fetch session token from database");
            AppError::DatabaseError(e.to_string())
        })?;

        let found = row.map(|row| SessionTokenModel {
            token: row.get("token"),
            email: row.get("email"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        });

        debug!(
            token = %token_prefix(token),
            found = found.is_some(),
            "Looked up session token in database"
        );
        Ok(found)
    }

    #[instrument(skip_all)]
    async fn delete_token(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, token = %token_prefix(token), "Failed to delete session token from database");
                AppError::DatabaseError(e.to_string())
            })?;

        let removed = result.rows_affected() > 0;
        debug!(token = %token_prefix(token), removed, "Deleted session token from database");
        Ok(removed)
    }
}
