use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::shared::AppError;

/// Database model for the session_tokens table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct SessionTokenModel {
    pub token: String, // Opaque bearer credential, primary key
    pub email: String, // Account that owns the token
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>, // Fixed at creation, never extended
}

/// Validity of a token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Active,
    Expired,
}

impl SessionTokenModel {
    /// Creates a token record issued now
    pub fn new(token: String, email: String, ttl: Duration) -> Result<Self, AppError> {
        Self::issued_at(token, email, Utc::now(), ttl)
    }

    /// Fails when `now + ttl` is not a representable timestamp
    pub fn issued_at(
        token: String,
        email: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, AppError> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::Configuration(format!("Session TTL of {} days is out of range", ttl.num_days()))
        })?;

        Ok(Self {
            token,
            email,
            created_at: now,
            expires_at,
        })
    }

    /// A token is expired strictly after `expires_at`
    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        if now > self.expires_at {
            TokenStatus::Expired
        } else {
            TokenStatus::Active
        }
    }

    pub fn is_expired(&self) -> bool {
        self.status_at(Utc::now()) == TokenStatus::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_model() {
        let token = SessionTokenModel::new(
            "tok".to_string(),
            "seller@test.de".to_string(),
            Duration::days(14),
        )
        .unwrap();

        assert_eq!(token.email, "seller@test.de");
        assert_eq!(token.expires_at - token.created_at, Duration::days(14));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_status_boundary() {
        let now = Utc::now();
        let token = SessionTokenModel::issued_at(
            "tok".to_string(),
            "a@test.de".to_string(),
            now,
            Duration::days(14),
        )
        .unwrap();

        assert_eq!(token.status_at(token.expires_at), TokenStatus::Active);
        assert_eq!(
            token.status_at(token.expires_at + Duration::milliseconds(1)),
            TokenStatus::Expired
        );
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let result = SessionTokenModel::issued_at(
            "tok".to_string(),
            "a@test.de".to_string(),
            Utc::now(),
            Duration::days(100_000_000),
        );

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
