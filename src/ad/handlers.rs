use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AdService,
    types::{AdRequest, AdResponse},
};
use crate::session::AuthenticatedAccount;
use crate::shared::{AppError, AppState};

fn ad_service(state: &AppState) -> AdService {
    AdService::new(Arc::clone(&state.ad_repository))
}

/// GET /api/ads
///
/// Returns all unsold ads, newest first
#[instrument(name = "list_ads", skip(state))]
pub async fn list_ads(State(state): State<AppState>) -> Result<Json<Vec<AdResponse>>, AppError> {
    let ads = ad_service(&state).list_ads().await?;
    info!(ad_count = ads.len(), "Ads listed");
    Ok(Json(ads))
}

/// GET /api/ads/mine
#[instrument(name = "list_own_ads", skip_all, fields(email = %account.email))]
pub async fn list_own_ads(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<Vec<AdResponse>>, AppError> {
    Ok(Json(ad_service(&state).list_own_ads(&account.email).await?))
}

/// GET /api/ads/:id
#[instrument(name = "get_ad", skip(state))]
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AdResponse>, AppError> {
    Ok(Json(ad_service(&state).get_ad(id).await?))
}

/// POST /api/ads
#[instrument(name = "create_ad", skip_all, fields(email = %account.email))]
pub async fn create_ad(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Json(request): Json<AdRequest>,
) -> Result<Json<AdResponse>, AppError> {
    Ok(Json(ad_service(&state).create_ad(&account.email, request).await?))
}

/// PUT /api/ads/:id
#[instrument(name = "update_ad", skip(state, account, request), fields(email = %account.email))]
pub async fn update_ad(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(id): Path<i64>,
    Json(request): Json<AdRequest>,
) -> Result<Json<AdResponse>, AppError> {
    Ok(Json(
        ad_service(&state)
            .update_ad(&account.email, id, request)
            .await?,
    ))
}

/// DELETE /api/ads/:id
#[instrument(name = "delete_ad", skip(state, account), fields(email = %account.email))]
pub async fn delete_ad(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ad_service(&state).delete_ad(&account.email, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::Request,
        routing::{get, put},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState, email: &str) -> Router {
        Router::new()
            .route("/api/ads", get(list_ads).post(create_ad))
            .route("/api/ads/:id", put(update_ad).delete(delete_ad))
            .layer(Extension(AuthenticatedAccount {
                email: email.to_string(),
            }))
            .with_state(state)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_ad_handler() {
        let app = app(AppStateBuilder::new().build(), "seller@test.de");

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/ads",
                r#"{"brand": "Nike", "size": "42", "price": "99.99"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let ad: AdResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(ad.brand, "Nike");
        assert_eq!(ad.owner_email, "seller@test.de");
        assert!(!ad.sold);
    }

    #[tokio::test]
    async fn test_create_ad_handler_rejects_bad_price() {
        let app = app(AppStateBuilder::new().build(), "seller@test.de");

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/ads",
                r#"{"brand": "Nike", "size": "42", "price": "cheap"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_ad_handler_non_owner() {
        let state = AppStateBuilder::new().build();
        let ad = AdService::new(state.ad_repository.clone())
            .create_ad(
                "owner@test.de",
                AdRequest {
                    brand: "Nike".into(),
                    size: "42".into(),
                    price: "99.99".into(),
                },
            )
            .await
            .unwrap();
        let app = app(state, "other@test.de");

        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/api/ads/{}", ad.id),
                r#"{"brand": "Nike", "size": "42", "price": "79.99"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_unknown_ad_handler() {
        let app = app(AppStateBuilder::new().build(), "owner@test.de");

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/ads/404")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
