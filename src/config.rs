use std::time::Duration;
use tracing::warn;

use crate::shared::AppError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 14;
pub const MAX_SESSION_TTL_DAYS: i64 = 36_500;

/// Process-wide configuration, read once at start-up
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL URL. When absent the server runs on in-memory repositories.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub cors_allowed_origins: Vec<String>,
    pub session_ttl_days: i64,
    pub cloudinary: CloudinarySettings,
    pub upload_policy: UploadPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: non_blank_var("DATABASE_URL"),
            bind_addr: non_blank_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            cors_allowed_origins: non_blank_var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]),
            session_ttl_days: session_ttl_days(std::env::var("SESSION_TTL_DAYS").ok().as_deref()),
            cloudinary: CloudinarySettings {
                cloud_name: non_blank_var("CLOUDINARY_CLOUD_NAME"),
                upload_preset: non_blank_var("CLOUDINARY_UPLOAD_PRESET"),
                api_base: non_blank_var("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_API_BASE.to_string()),
            },
            upload_policy: UploadPolicy {
                timeout: Duration::from_secs(
                    std::env::var("IMAGE_UPLOAD_TIMEOUT_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(30),
                ),
                max_retries: std::env::var("IMAGE_UPLOAD_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
            },
        }
    }
}

/// Raw Cloudinary settings as found in the environment
#[derive(Debug, Clone, Default)]
pub struct CloudinarySettings {
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub api_base: String,
}

impl CloudinarySettings {
    /// Checks that both secrets are present and non-blank
    pub fn validate(&self) -> Result<CloudinaryConfig, AppError> {
        let missing: Vec<&str> = [
            ("CLOUDINARY_CLOUD_NAME", &self.cloud_name),
            ("CLOUDINARY_UPLOAD_PRESET", &self.upload_preset),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(AppError::Configuration(format!(
                "Cloudinary configuration missing ({})",
                missing.join("/")
            )));
        }

        Ok(CloudinaryConfig {
            cloud_name: self.cloud_name.clone().unwrap_or_default().trim().to_string(),
            upload_preset: self
                .upload_preset
                .clone()
                .unwrap_or_default()
                .trim()
                .to_string(),
            api_base: self.api_base.trim_end_matches('/').to_string(),
        })
    }
}

/// Validated Cloudinary configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    pub fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base, self.cloud_name)
    }
}

/// Timeout and retry budget for the outbound image upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub timeout: Duration,
    /// Extra attempts after a transport failure (connect error or timeout).
    /// Upstream HTTP errors are never retried.
    pub max_retries: u32,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
        }
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts 1 to `MAX_SESSION_TTL_DAYS` days, anything else falls back to the default
fn session_ttl_days(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_SESSION_TTL_DAYS;
    };

    match raw.parse::<i64>() {
        Ok(days) if (1..=MAX_SESSION_TTL_DAYS).contains(&days) => days,
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_SESSION_TTL_DAYS,
                "SESSION_TTL_DAYS out of range, using default"
            );
            DEFAULT_SESSION_TTL_DAYS
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
