use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{error::ApiError, state::AppState};

/// Authenticated caller, inserted as a request extension by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Bearer-token gate for the authenticated router. Missing or invalid
/// credentials short-circuit with a 401 `{error}` body.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let session = state
        .identity
        .authenticate(bearer)
        .await
        .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser {
        user_id: session.user_id,
    });
    Ok(next.run(req).await)
}
