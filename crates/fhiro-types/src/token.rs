use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a signed-in session token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// JWT claims shared by the REST middleware and the admin gateway.
/// `sid` names the session row; the token is only honoured while it exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub sid: Uuid,
    pub exp: usize,
}

pub fn issue_token(secret: &str, user_id: Uuid, email: &str, session_id: Uuid) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        sid: session_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry. Session liveness is the caller's job.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
