use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use fhiro_types::intake::ValidationError;

/// Shown for any failure the visitor can't fix themselves.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body was not JSON, or not the expected shape.
    #[error("{}", .0.body_text())]
    MalformedBody(#[from] JsonRejection),

    #[error("not signed in")]
    Unauthorized,

    #[error("{0} is not authorized")]
    AccessDenied(String),

    #[error("email is already registered")]
    Conflict,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "message": e.to_string() }),
            ),
            Self::MalformedBody(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "status": "error", "message": rejection.body_text() }),
                )
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "status": "error", "message": "Sign in to access the dashboard" }),
            ),
            Self::AccessDenied(email) => (
                StatusCode::FORBIDDEN,
                json!({ "status": "error", "message": "Access Denied", "email": email }),
            ),
            Self::Conflict => (
                StatusCode::CONFLICT,
                json!({ "status": "error", "message": self.to_string() }),
            ),
            Self::Internal(e) => {
                error!("Request failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": GENERIC_FAILURE }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
