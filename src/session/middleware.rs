use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Account resolved from the bearer token, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub email: String,
}

/// Bearer authentication middleware - resolves the session token and adds
/// `AuthenticatedAccount` to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::require_auth))
/// Handlers can then extract `Extension(account): Extension<AuthenticatedAccount>`.
#[instrument(skip_all)]
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!(uri = %req.uri(), "Authenticating request");

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let email = match state
        .auth_service
        .resolve_account_id_from_bearer_header(header)
        .await?
    {
        Some(email) => email,
        None => {
            warn!(
                header_present = header.is_some(),
                "Rejecting request without a valid session"
            );
            return Err(AppError::Unauthorized("Not logged in".to_string()));
        }
    };

    debug!(email = %email, "Authentication successful");
    req.extensions_mut().insert(AuthenticatedAccount { email });

    Ok(next.run(req).await)
}
