use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use fhiro_admin::aggregate::waitlist_stats;
use fhiro_admin::dashboard::Dashboard;
use fhiro_admin::filter::filter;
use fhiro_types::api::{ContactsPage, WaitlistPage};
use fhiro_types::models::{Collection, ContactEntry, WaitlistEntry};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /admin/waitlist?q= — stats over everything, entries filtered.
pub async fn waitlist(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<WaitlistPage>, ApiError> {
    let entries = state
        .with_db(|db| Ok(db.list_waitlist()?.into_iter().map(WaitlistEntry::from).collect::<Vec<_>>()))
        .await?;

    let stats = waitlist_stats(&entries, Utc::now());
    let entries = filter(&entries, &query.q).into_iter().cloned().collect();
    Ok(Json(WaitlistPage { stats, entries }))
}

/// GET /admin/contacts?q=
pub async fn contacts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ContactsPage>, ApiError> {
    let entries = state
        .with_db(|db| Ok(db.list_contacts()?.into_iter().map(ContactEntry::from).collect::<Vec<_>>()))
        .await?;

    let total = entries.len();
    let entries = filter(&entries, &query.q).into_iter().cloned().collect();
    Ok(Json(ContactsPage { total, entries }))
}

/// GET /admin/export/{tab}?q= — CSV download of the filtered tab.
pub async fn export(
    State(state): State<AppState>,
    Path(tab): Path<Collection>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut dashboard = Dashboard::new();
    let snapshot = state.with_db(move |db| db.load_snapshot(tab)).await?;
    dashboard.apply(snapshot);
    dashboard.select_tab(tab);
    dashboard.set_search(query.q);

    let export = dashboard.export(&state.export_prefix, Utc::now());
    info!("Exported {}", export.filename);

    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}
