use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use fhiro_gateway::session::{self, SessionError};
use fhiro_types::token::Claims;

use crate::error::ApiError;
use crate::state::AppState;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Validate the bearer token and its session, then expose the claims.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let claims = session::authenticate(&state.db, &state.jwt_secret, &token)
        .await
        .map_err(|e| match e {
            SessionError::Store(e) => ApiError::Internal(e),
            other => {
                warn!("Rejected session: {}", other);
                ApiError::Unauthorized
            }
        })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Only allow-listed identities past this point. Runs after `require_session`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = req
        .extensions()
        .get::<Claims>()
        .map(|c| c.email.clone())
        .ok_or(ApiError::Unauthorized)?;

    if !state.policy.is_authorized(&email) {
        warn!("{} denied admin access to {}", email, req.uri().path());
        return Err(ApiError::AccessDenied(email));
    }

    Ok(next.run(req).await)
}
