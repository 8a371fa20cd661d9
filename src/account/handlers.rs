use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AccountService,
    types::{AuthResponse, CredentialsRequest, MeResponse},
};
use crate::session::{AuthService, AuthenticatedAccount};
use crate::shared::{AppError, AppState};

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(
        Arc::clone(&state.account_repository),
        Arc::clone(&state.session_store),
    )
}

/// Client errors keep the `{success, message}` envelope; server errors use the
/// regular error body.
fn auth_failure(error: AppError) -> Response {
    if error.status_code().is_client_error() {
        (
            error.status_code(),
            Json(AuthResponse::failure(error.public_message())),
        )
            .into_response()
    } else {
        error.into_response()
    }
}

/// POST /api/register
#[instrument(name = "register", skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Response {
    match account_service(&state).register(request).await {
        Ok(token) => Json(AuthResponse::with_token(token, "Registration successful")).into_response(),
        Err(e) => auth_failure(e),
    }
}

/// POST /api/login
#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Response {
    match account_service(&state).login(request).await {
        Ok(token) => Json(AuthResponse::with_token(token, "Login successful")).into_response(),
        Err(e) => auth_failure(e),
    }
}

/// POST /api/logout
///
/// Revokes the presented token. Succeeds even when no token is sent.
#[instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthResponse>, AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    if let Some(token) = AuthService::bearer_token(header) {
        account_service(&state).logout(token).await?;
        info!("Logged out");
    }

    Ok(Json(AuthResponse::ok("Logged out")))
}

/// GET /api/me
pub async fn me(Extension(account): Extension<AuthenticatedAccount>) -> Json<MeResponse> {
    Json(MeResponse {
        email: account.email,
    })
}
