use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use fhiro_types::api::{SubmitResponse, SubmitStatus, WaitlistSignupRequest};
use fhiro_types::models::{Collection, SPECIALTIES};

use crate::error::ApiError;
use crate::state::AppState;

pub const WAITLIST_SUCCESS: &str = "You're on the list. We'll be in touch.";

/// POST /waitlist — normalize, persist, and wake live dashboards.
pub async fn join_waitlist(
    State(state): State<AppState>,
    payload: Result<Json<WaitlistSignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let entry = req.normalize().inspect_err(|e| warn!("Waitlist signup rejected: {}", e))?;

    let id = Uuid::new_v4();
    let specialty = entry.specialty.clone();
    state
        .with_db(move |db| db.insert_waitlist(&id.to_string(), &entry))
        .await?;

    state.dispatcher.notify(Collection::Waitlist);
    info!("Waitlist signup {} ({})", id, specialty);

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            status: SubmitStatus::Success,
            message: WAITLIST_SUCCESS.to_string(),
            id: Some(id),
        }),
    ))
}

/// GET /waitlist/specialties — options for the signup form.
pub async fn specialties() -> Json<&'static [&'static str]> {
    Json(SPECIALTIES)
}
