use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::account::repository::{InMemoryAccountRepository, PostgresAccountRepository};
use crate::ad::repository::{InMemoryAdRepository, PostgresAdRepository};
use crate::image::ImageUploader;
use crate::notification::repository::{
    InMemoryNotificationRepository, PostgresNotificationRepository,
};
use crate::purchase::repository::{InMemoryPurchaseRepository, PostgresPurchaseRepository};
use crate::session::repository::{InMemorySessionTokenRepository, PostgresSessionTokenRepository};
use crate::session::{require_auth, SessionTokenStore};
use crate::shared::AppState;
use crate::{account, ad, image, notification, purchase};

/// Largest accepted request body on the image upload route
pub const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl AppState {
    /// State backed by process memory. Data is lost on restart.
    pub fn in_memory(session_ttl: Duration, image_uploader: Arc<dyn ImageUploader>) -> Self {
        let ad_repository = Arc::new(InMemoryAdRepository::new());
        let notification_repository = Arc::new(InMemoryNotificationRepository::new());
        let purchase_repository = Arc::new(InMemoryPurchaseRepository::new(
            ad_repository.clone(),
            notification_repository.clone(),
        ));
        let session_store = SessionTokenStore::new(Arc::new(InMemorySessionTokenRepository::new()))
            .with_ttl(session_ttl);

        Self::new(
            Arc::new(InMemoryAccountRepository::new()),
            ad_repository,
            purchase_repository,
            notification_repository,
            Arc::new(session_store),
            image_uploader,
        )
    }

    /// State backed by PostgreSQL
    pub fn postgres(
        pool: PgPool,
        session_ttl: Duration,
        image_uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        let session_store =
            SessionTokenStore::new(Arc::new(PostgresSessionTokenRepository::new(pool.clone())))
                .with_ttl(session_ttl);

        Self::new(
            Arc::new(PostgresAccountRepository::new(pool.clone())),
            Arc::new(PostgresAdRepository::new(pool.clone())),
            Arc::new(PostgresPurchaseRepository::new(pool.clone())),
            Arc::new(PostgresNotificationRepository::new(pool)),
            Arc::new(session_store),
            image_uploader,
        )
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Builds the full HTTP API
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    // Routes that need a logged-in account. The middleware puts
    // `AuthenticatedAccount` into the request extensions.
    let protected = Router::new()
        .route("/api/me", get(account::me))
        .route("/api/ads", post(ad::create_ad))
        .route("/api/ads/mine", get(ad::list_own_ads))
        .route("/api/ads/:id", put(ad::update_ad).delete(ad::delete_ad))
        .route("/api/purchases", get(purchase::list_purchases))
        .route("/api/purchases/checkout", post(purchase::checkout))
        .route("/api/notifications", get(notification::list_notifications))
        .route(
            "/api/notifications/:id/read",
            post(notification::mark_notification_read),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // The image gateway resolves the bearer header itself
    let images = Router::new().route(
        "/api/ads/:id/image",
        post(image::upload_ad_image)
            .delete(image::delete_ad_image)
            .layer(DefaultBodyLimit::max(MAX_IMAGE_UPLOAD_BYTES)),
    );

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/register", post(account::register))
        .route("/api/login", post(account::login))
        .route("/api/logout", post(account::logout))
        .route("/api/ads", get(ad::list_ads))
        .route("/api/ads/:id", get(ad::get_ad))
        .merge(protected)
        .merge(images)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
