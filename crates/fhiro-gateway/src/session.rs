//! Session checks shared by the REST middleware and the gateway.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use fhiro_db::Database;
use fhiro_types::token::{Claims, decode_token};

use crate::dispatcher::Dispatcher;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid token: {0}")]
    InvalidToken(anyhow::Error),

    #[error("session {0} has been revoked")]
    Revoked(Uuid),

    /// The session table could not be read. Not the caller's fault.
    #[error("session store unavailable: {0:#}")]
    Store(anyhow::Error),
}

/// Verify a bearer token and that its session has not been revoked.
pub async fn authenticate(
    db: &Arc<Database>,
    jwt_secret: &str,
    token: &str,
) -> Result<Claims, SessionError> {
    let claims = decode_token(jwt_secret, token).map_err(SessionError::InvalidToken)?;

    if !is_live(db, claims.sid).await.map_err(SessionError::Store)? {
        return Err(SessionError::Revoked(claims.sid));
    }
    Ok(claims)
}

/// Whether the session row still exists.
pub async fn is_live(db: &Arc<Database>, sid: Uuid) -> anyhow::Result<bool> {
    let db = db.clone();
    let sid = sid.to_string();
    tokio::task::spawn_blocking(move || db.session_exists(&sid)).await?
}

/// Revoke the session behind `claims` and tell open connections about it.
/// Returns false if it was already gone.
pub async fn revoke(
    db: &Arc<Database>,
    dispatcher: &Dispatcher,
    claims: &Claims,
) -> anyhow::Result<bool> {
    let db = db.clone();
    let sid = claims.sid.to_string();
    let removed = tokio::task::spawn_blocking(move || db.delete_session(&sid)).await??;
    dispatcher.session_revoked(claims.sid);
    Ok(removed)
}
