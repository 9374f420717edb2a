//! End-to-end admin gateway: a real listener, a real WebSocket client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;
use uuid::Uuid;

use fhiro_admin::access::AccessPolicy;
use fhiro_api::routes::router;
use fhiro_api::state::{AppState, AppStateInner};
use fhiro_db::Database;
use fhiro_gateway::connection::HEARTBEAT_INTERVAL;
use fhiro_types::models::{Collection, NewWaitlistEntry};
use fhiro_types::token::issue_token;

const ADMIN: &str = "connectjinish@gmail.com";
const SECRET: &str = "gateway-test-secret";

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, AppState) {
    spawn_server_with(HEARTBEAT_INTERVAL).await
}

async fn spawn_server_with(heartbeat: Duration) -> (SocketAddr, AppState) {
    let db = Arc::new(Database::open_in_memory().expect("in-memory db"));
    let state = AppStateInner::with_heartbeat(
        db,
        SECRET.into(),
        AccessPolicy::new([ADMIN]),
        "fhiro".into(),
        heartbeat,
    );
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// Create an account with a live session and return its token.
fn sign_in(state: &AppState, email: &str) -> String {
    let user = Uuid::new_v4();
    let sid = Uuid::new_v4();
    state.db.create_user(&user.to_string(), email, "unused-hash").unwrap();
    state.db.create_session(&sid.to_string(), &user.to_string()).unwrap();
    issue_token(SECRET, user, email, sid).unwrap()
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{}/gateway", addr))
        .await
        .expect("gateway connect");
    ws
}

async fn send(ws: &mut Ws, command: Value) {
    ws.send(Message::text(command.to_string())).await.expect("send command");
}

/// Next JSON event, skipping control frames.
async fn next_event(ws: &mut Ws) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for gateway event")?;
        match msg {
            Ok(Message::Text(text)) => return Some(serde_json::from_str(&text).expect("json event")),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// Next raw frame, control frames included. `None` once the socket is gone.
async fn next_frame(ws: &mut Ws) -> Option<Message> {
    tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for gateway frame")?
        .ok()
}

async fn listeners_drained(state: &AppState) -> bool {
    for _ in 0..50 {
        if state.dispatcher.listener_count() == 0 && state.dispatcher.active_views().await.is_empty() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

fn signup(name: &str, email: &str) -> NewWaitlistEntry {
    NewWaitlistEntry {
        name: name.into(),
        email: email.into(),
        specialty: "Paediatrics".into(),
        location: "Galway".into(),
        source: "landing_page".into(),
    }
}

/// Skip events until one satisfies `pred`.
async fn wait_for(ws: &mut Ws, pred: impl Fn(&Value) -> bool) -> Value {
    loop {
        let event = next_event(ws).await.expect("gateway closed early");
        if pred(&event) {
            return event;
        }
    }
}

fn is_view(event: &Value) -> bool {
    event["type"] == "DashboardView"
}

#[tokio::test]
async fn admin_gets_live_dashboard() {
    let (addr, state) = spawn_server().await;
    let token = sign_in(&state, ADMIN);
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "Identify", "data": { "token": token } })).await;

    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["data"]["state"], "authenticating");
    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["type"], "AccessState");
    assert_eq!(event["data"]["state"], "authorized");
    assert_eq!(event["data"]["email"], ADMIN);

    let view = wait_for(&mut ws, |e| is_view(e) && e["data"]["loading"] == false).await;
    assert_eq!(view["data"]["waitlist_total"], 0);
    assert_eq!(state.dispatcher.listener_count(), 2);
    assert_eq!(state.dispatcher.active_views().await.len(), 1);

    // A new signup lands as a fresh full snapshot
    state
        .db
        .insert_waitlist(&Uuid::new_v4().to_string(), &signup("Ana", "ana@x.ie"))
        .unwrap();
    state.dispatcher.notify(Collection::Waitlist);

    let view = wait_for(&mut ws, |e| is_view(e) && e["data"]["waitlist_total"] == 1).await;
    assert_eq!(view["data"]["stats"]["this_week"], 1);
    assert_eq!(view["data"]["stats"]["top_specialty"], "Paediatrics");
    assert_eq!(view["data"]["rows"]["kind"], "waitlist");
    assert_eq!(view["data"]["rows"]["entries"][0]["name"], "Ana");

    send(&mut ws, json!({ "type": "Search", "data": { "term": "nobody" } })).await;
    let view = wait_for(&mut ws, |e| is_view(e) && e["data"]["search"] == "nobody").await;
    assert_eq!(view["data"]["rows"]["entries"].as_array().unwrap().len(), 0);

    send(&mut ws, json!({ "type": "Search", "data": { "term": "GALWAY" } })).await;
    wait_for(&mut ws, |e| is_view(e) && e["data"]["search"] == "GALWAY").await;

    send(&mut ws, json!({ "type": "Export" })).await;
    let export = wait_for(&mut ws, |e| e["type"] == "Export").await;
    assert_eq!(export["data"]["content_type"], "text/csv");
    assert!(export["data"]["filename"].as_str().unwrap().starts_with("fhiro-waitlist-"));
    assert_eq!(export["data"]["csv"].as_str().unwrap().lines().count(), 2);

    send(&mut ws, json!({ "type": "SelectTab", "data": { "tab": "contacts" } })).await;
    let view = wait_for(&mut ws, |e| is_view(e) && e["data"]["tab"] == "contacts").await;
    assert_eq!(view["data"]["rows"]["kind"], "contacts");

    send(&mut ws, json!({ "type": "SignOut" })).await;
    wait_for(&mut ws, |e| e["type"] == "SignedOut").await;

    // Subscriptions and the view go away with the connection
    assert!(listeners_drained(&state).await);
}

#[tokio::test]
async fn other_identity_is_denied_without_subscriptions() {
    let (addr, state) = spawn_server().await;
    let token = sign_in(&state, "someone@else.ie");
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "Identify", "data": { "token": token } })).await;
    wait_for(&mut ws, |e| e["data"]["state"] == "authenticating").await;
    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["data"]["state"], "unauthorized");
    assert_eq!(event["data"]["email"], "someone@else.ie");

    // Commands other than SignOut get nothing back
    send(&mut ws, json!({ "type": "Export" })).await;
    send(&mut ws, json!({ "type": "SignOut" })).await;
    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["type"], "AccessState");
    assert_eq!(event["data"]["state"], "unauthenticated");
    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["type"], "SignedOut");

    assert_eq!(state.dispatcher.listener_count(), 0);
    assert!(state.dispatcher.active_views().await.is_empty());
}

#[tokio::test]
async fn bad_token_leaves_view_signed_out() {
    let (addr, _state) = spawn_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "Identify", "data": { "token": "forged" } })).await;
    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["data"]["state"], "authenticating");
    let event = next_event(&mut ws).await.unwrap();
    assert_eq!(event["data"]["state"], "unauthenticated");
    assert!(event["data"]["email"].is_null());

    assert!(next_event(&mut ws).await.is_none());
}

#[tokio::test]
async fn logout_elsewhere_ends_live_dashboard() {
    let (addr, state) = spawn_server().await;
    let token = sign_in(&state, ADMIN);
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "Identify", "data": { "token": token } })).await;
    wait_for(&mut ws, |e| e["data"]["state"] == "authorized").await;
    wait_for(&mut ws, |e| is_view(e) && e["data"]["loading"] == false).await;

    // Sign out over REST while the socket stays open
    let logout = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = router(state.clone()).oneshot(logout).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let event = wait_for(&mut ws, |e| e["type"] == "AccessState").await;
    assert_eq!(event["data"]["state"], "unauthenticated");
    assert!(event["data"]["email"].is_null());
    wait_for(&mut ws, |e| e["type"] == "SignedOut").await;
    assert!(listeners_drained(&state).await);

    // New records no longer reach the signed-out socket
    state
        .db
        .insert_waitlist(&Uuid::new_v4().to_string(), &signup("Leak", "leak@x.ie"))
        .unwrap();
    state.dispatcher.notify(Collection::Waitlist);
    assert!(next_event(&mut ws).await.is_none());
}

#[tokio::test]
async fn silent_denied_client_is_pinged_then_dropped() {
    let (addr, state) = spawn_server_with(Duration::from_millis(100)).await;
    let token = sign_in(&state, "someone@else.ie");
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "Identify", "data": { "token": token } })).await;
    wait_for(&mut ws, |e| e["data"]["state"] == "unauthorized").await;

    // Denied connections are heartbeated too
    loop {
        match next_frame(&mut ws).await {
            Some(Message::Ping(_)) => break,
            Some(_) => continue,
            None => panic!("gateway closed before pinging"),
        }
    }

    // Stop reading, so no pongs go back
    tokio::time::sleep(Duration::from_millis(800)).await;

    let mut dropped = false;
    for _ in 0..100 {
        match next_frame(&mut ws).await {
            Some(Message::Close(_)) | None => {
                dropped = true;
                break;
            }
            Some(_) => continue,
        }
    }
    assert!(dropped);
    assert_eq!(state.dispatcher.listener_count(), 0);
}
