use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use fhiro_gateway::connection;

use crate::middleware::{require_admin, require_session};
use crate::state::AppState;
use crate::{admin, auth, contacts, waitlist};

/// Every HTTP and WebSocket route the service exposes.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/waitlist", post(waitlist::join_waitlist))
        .route("/waitlist/specialties", get(waitlist::specialties))
        .route("/contact", post(contacts::send_message))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::current_session))
        .route("/gateway", get(gateway_upgrade));

    let session_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    // Layers run outermost-last: session check first, then the allow-list
    let admin_routes = Router::new()
        .route("/admin/waitlist", get(admin::waitlist))
        .route("/admin/contacts", get(admin::contacts))
        .route("/admin/export/{tab}", get(admin::export))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let views = state.dispatcher.active_views().await.len();
    Json(json!({ "status": "ok", "active_views": views }))
}

async fn gateway_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let ctx = state.gateway_context();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, ctx))
}
