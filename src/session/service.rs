use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    generators::{TokenGenerator, UuidTokenGenerator},
    models::{SessionTokenModel, TokenStatus},
    repository::SessionTokenRepository,
    token_prefix,
};
use crate::config::DEFAULT_SESSION_TTL_DAYS;
use crate::shared::AppError;

/// Issues, resolves and revokes opaque session tokens.
///
/// Tokens live for a fixed TTL counted from issuance. Expiry is enforced
/// lazily: an expired record is deleted the first time it is looked up.
pub struct SessionTokenStore {
    repository: Arc<dyn SessionTokenRepository + Send + Sync>,
    generator: Arc<dyn TokenGenerator>,
    ttl: Duration,
}

impl SessionTokenStore {
    pub fn new(repository: Arc<dyn SessionTokenRepository + Send + Sync>) -> Self {
        Self {
            repository,
            generator: Arc::new(UuidTokenGenerator::new()),
            ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates and stores a fresh token for the account
    #[instrument(skip(self))]
    pub async fn issue_token(&self, email: &str) -> Result<String, AppError> {
        let token = self.generator.generate();
        let record = SessionTokenModel::new(token.clone(), email.to_string(), self.ttl)?;

        self.repository.insert_token(&record).await?;

        info!(
            token = %token_prefix(&token),
            expires_at = %record.expires_at,
            "Issued session token"
        );
        Ok(token)
    }

    /// Returns the owning account, or `None` for blank, unknown or expired tokens
    #[instrument(skip_all)]
    pub async fn resolve_account_id(&self, token: &str) -> Result<Option<String>, AppError> {
        if token.trim().is_empty() {
            return Ok(None);
        }

        let Some(record) = self.repository.find_token(token).await? else {
            debug!(token = %token_prefix(token), "Unknown session token");
            return Ok(None);
        };

        match record.status_at(Utc::now()) {
            TokenStatus::Active => Ok(Some(record.email)),
            TokenStatus::Expired => {
                info!(
                    token = %token_prefix(token),
                    expired_at = %record.expires_at,
                    "Session token expired, removing"
                );
                self.repository.delete_token(token).await?;
                Ok(None)
            }
        }
    }

    /// Deletes the token. Blank tokens and unknown tokens are ignored.
    #[instrument(skip_all)]
    pub async fn revoke_token(&self, token: &str) -> Result<(), AppError> {
        if token.trim().is_empty() {
            return Ok(());
        }

        let removed = self.repository.delete_token(token).await?;
        info!(token = %token_prefix(token), removed, "Revoked session token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::repository::InMemorySessionTokenRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory repository and counts lookups
    struct CountingRepository {
        inner: InMemorySessionTokenRepository,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl SessionTokenRepository for CountingRepository {
        async fn insert_token(&self, token: &SessionTokenModel) -> Result<(), AppError> {
            self.inner.insert_token(token).await
        }
        async fn find_token(&self, token: &str) -> Result<Option<SessionTokenModel>, AppError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_token(token).await
        }
        async fn delete_token(&self, token: &str) -> Result<bool, AppError> {
            self.inner.delete_token(token).await
        }
    }

    struct FixedGenerator(&'static str);

    impl TokenGenerator for FixedGenerator {
        fn generate(&self) -> String {
            self.0.to_string()
        }
    }

    fn expired_record(token: &str, email: &str) -> SessionTokenModel {
        SessionTokenModel::issued_at(
            token.to_string(),
            email.to_string(),
            Utc::now() - Duration::days(15),
            Duration::days(14),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_issued_token_resolves_to_account() {
        let repo = Arc::new(InMemorySessionTokenRepository::new());
        let store = SessionTokenStore::new(repo.clone());

        let token = store.issue_token("seller@test.de").await.unwrap();

        assert!(!token.is_empty());
        assert_eq!(repo.token_count(), 1);
        assert_eq!(
            store.resolve_account_id(&token).await.unwrap(),
            Some("seller@test.de".to_string())
        );
    }

    #[tokio::test]
    async fn test_issued_tokens_are_unique() {
        let store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()));

        let first = store.issue_token("a@test.de").await.unwrap();
        let second = store.issue_token("a@test.de").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_issued_token_uses_configured_ttl() {
        let repo = Arc::new(InMemorySessionTokenRepository::new());
        let store = SessionTokenStore::new(repo.clone())
            .with_generator(Arc::new(FixedGenerator("fixed-token")))
            .with_ttl(Duration::days(3));

        store.issue_token("a@test.de").await.unwrap();

        let record = repo.find_token("fixed-token").await.unwrap().unwrap();
        assert_eq!(record.expires_at - record.created_at, Duration::days(3));
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_fails_without_storing() {
        let repo = Arc::new(InMemorySessionTokenRepository::new());
        let store = SessionTokenStore::new(repo.clone()).with_ttl(Duration::days(100_000_000));

        let result = store.issue_token("a@test.de").await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert_eq!(repo.token_count(), 0);
    }

    #[tokio::test]
    async fn test_default_ttl_is_fourteen_days() {
        let store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()));
        assert_eq!(store.ttl(), Duration::days(14));
    }

    #[tokio::test]
    async fn test_expired_token_is_absent_and_deleted() {
        let repo = Arc::new(InMemorySessionTokenRepository::with_tokens(vec![
            expired_record("old-token", "a@test.de"),
        ]));
        let store = SessionTokenStore::new(repo.clone());

        assert_eq!(store.resolve_account_id("old-token").await.unwrap(), None);
        assert!(!repo.has_token("old-token"));
    }

    #[tokio::test]
    async fn test_unknown_token_is_absent() {
        let store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()));
        assert_eq!(store.resolve_account_id("does-not-exist").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_token_skips_storage_lookup() {
        let repo = Arc::new(CountingRepository {
            inner: InMemorySessionTokenRepository::new(),
            lookups: AtomicUsize::new(0),
        });
        let store = SessionTokenStore::new(repo.clone());

        assert_eq!(store.resolve_account_id("").await.unwrap(), None);
        assert_eq!(store.resolve_account_id("   ").await.unwrap(), None);
        assert_eq!(repo.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_revoke_then_resolve_is_absent() {
        let store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()));
        let token = store.issue_token("a@test.de").await.unwrap();

        store.revoke_token(&token).await.unwrap();

        assert_eq!(store.resolve_account_id(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_twice_is_not_an_error() {
        let store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()));
        let token = store.issue_token("a@test.de").await.unwrap();

        assert!(store.revoke_token(&token).await.is_ok());
        assert!(store.revoke_token(&token).await.is_ok());
        assert!(store.revoke_token("").await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_only_affects_given_token() {
        let store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()));
        let phone = store.issue_token("a@test.de").await.unwrap();
        let laptop = store.issue_token("a@test.de").await.unwrap();

        store.revoke_token(&phone).await.unwrap();

        assert_eq!(
            store.resolve_account_id(&laptop).await.unwrap(),
            Some("a@test.de".to_string())
        );
    }
}
