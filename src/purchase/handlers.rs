use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use tracing::instrument;

use super::{
    service::PurchaseService,
    types::{CheckoutRequest, CheckoutResponse, PurchaseResponse},
};
use crate::session::AuthenticatedAccount;
use crate::shared::{AppError, AppState};

/// POST /api/purchases/checkout
///
/// Buys all ads in `adIds` or none of them
#[instrument(name = "checkout", skip_all, fields(email = %account.email))]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let service = PurchaseService::new(Arc::clone(&state.purchase_repository));
    Ok(Json(service.checkout(&account.email, request.ad_ids).await?))
}

/// GET /api/purchases
#[instrument(name = "list_purchases", skip_all, fields(email = %account.email))]
pub async fn list_purchases(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<Vec<PurchaseResponse>>, AppError> {
    let service = PurchaseService::new(Arc::clone(&state.purchase_repository));
    Ok(Json(service.list_purchases(&account.email).await?))
}
