use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use fhiro_types::api::{ContactRequest, SubmitResponse, SubmitStatus};
use fhiro_types::models::Collection;

use crate::error::ApiError;
use crate::state::AppState;

pub const CONTACT_SUCCESS: &str = "Message sent. We'll get back to you soon.";

/// POST /contact
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let entry = req.normalize().inspect_err(|e| warn!("Contact message rejected: {}", e))?;

    let id = Uuid::new_v4();
    state
        .with_db(move |db| db.insert_contact(&id.to_string(), &entry))
        .await?;

    state.dispatcher.notify(Collection::Contacts);
    info!("Contact message {} received", id);

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            status: SubmitStatus::Success,
            message: CONTACT_SUCCESS.to_string(),
            id: Some(id),
        }),
    ))
}
