use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use fhiro_gateway::session::{self, SessionError};
use fhiro_types::api::{LoginRequest, RegisterRequest, SessionResponse, TokenResponse};
use fhiro_types::intake::{check_password, normalize_email, validated_email};
use fhiro_types::token::{Claims, issue_token};

use crate::error::ApiError;
use crate::middleware::bearer_token;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let email = validated_email(&req.email)?;
    check_password(&req.password)?;

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let session_id = Uuid::new_v4();

    let db_email = email.clone();
    let created = state
        .with_db(move |db| {
            db.register_account(
                &user_id.to_string(),
                &db_email,
                &password_hash,
                &session_id.to_string(),
            )
        })
        .await?;

    if !created {
        warn!("Registration refused: {} is taken", email);
        return Err(ApiError::Conflict);
    }

    let token = issue_token(&state.jwt_secret, user_id, &email, session_id)?;
    info!("Registered {}", email);

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            user_id,
            email,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);

    let lookup = email.clone();
    let user = state
        .with_db(move |db| db.get_user_by_email(&lookup))
        .await?
        .ok_or_else(|| {
            warn!("Sign-in failed: unknown account {}", email);
            ApiError::Unauthorized
        })?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.email, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!("Sign-in failed: wrong password for {}", user.email);
            ApiError::Unauthorized
        })?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let session_id = Uuid::new_v4();
    state
        .with_db(move |db| db.create_session(&session_id.to_string(), &user_id.to_string()))
        .await?;

    let token = issue_token(&state.jwt_secret, user_id, &user.email, session_id)?;
    info!("{} signed in", user.email);

    Ok(Json(TokenResponse {
        user_id,
        email: user.email,
        token,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    session::revoke(&state.db, &state.dispatcher, &claims).await?;
    info!("{} signed out", claims.email);
    Ok(StatusCode::NO_CONTENT)
}

/// Where the caller stands: signed out, signed in but not allowed, or admin.
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let claims = match bearer_token(&headers) {
        Some(token) => match session::authenticate(&state.db, &state.jwt_secret, token).await {
            Ok(claims) => Some(claims),
            Err(SessionError::Store(e)) => return Err(ApiError::Internal(e)),
            Err(e) => {
                warn!("Ignoring invalid session: {}", e);
                None
            }
        },
        None => None,
    };

    let email = claims.map(|c| c.email);
    let access = state.policy.resolve(email.as_deref());
    Ok(Json(SessionResponse { access, email }))
}
