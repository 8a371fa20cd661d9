use axum::Router;

use marketplace::{
    build_router,
    config::{CloudinarySettings, UploadPolicy, DEFAULT_BIND_ADDR, DEFAULT_SESSION_TTL_DAYS},
    image::uploader_from_config,
    AppConfig, AppState,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub state: AppState,
}

pub struct TestSetupBuilder {
    cloudinary: CloudinarySettings,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            cloudinary: CloudinarySettings::default(),
        }
    }

    /// Sends uploads to the Cloudinary-compatible server at `api_base`
    pub fn with_image_host(self, api_base: &str) -> Self {
        self.with_cloudinary_settings(CloudinarySettings {
            cloud_name: Some("demo-cloud".to_string()),
            upload_preset: Some("unsigned-preset".to_string()),
            api_base: api_base.to_string(),
        })
    }

    /// Invalid settings end up as a disabled uploader, as on server start-up
    pub fn with_cloudinary_settings(mut self, settings: CloudinarySettings) -> Self {
        self.cloudinary = settings;
        self
    }

    pub fn build(self) -> TestSetup {
        let config = AppConfig {
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            cloudinary: self.cloudinary,
            upload_policy: UploadPolicy::default(),
        };

        let uploader = uploader_from_config(&config);
        let state = AppState::in_memory(chrono::Duration::days(config.session_ttl_days), uploader);
        let app = build_router(state.clone(), &config.cors_allowed_origins);

        TestSetup { app, state }
    }
}
