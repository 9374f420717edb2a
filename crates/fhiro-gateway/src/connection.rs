use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use uuid::Uuid;

use fhiro_admin::access::{AccessMachine, AccessPolicy};
use fhiro_admin::dashboard::Dashboard;
use fhiro_db::Database;
use fhiro_types::events::{GatewayCommand, GatewayEvent};
use fhiro_types::models::{Collection, Snapshot};
use fhiro_types::token::Claims;

use crate::dispatcher::Dispatcher;
use crate::live::{SnapshotSource, Subscription};
use crate::session::{self, SessionError};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long a fresh socket has to send `Identify`.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

/// Everything an admin view connection needs from the server.
#[derive(Clone)]
pub struct GatewayContext {
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
    pub source: Arc<dyn SnapshotSource>,
    pub policy: Arc<AccessPolicy>,
    pub jwt_secret: String,
    pub export_prefix: String,
    pub heartbeat_interval: Duration,
}

/// Drive one admin view: identify, authorize, then stream the dashboard.
pub async fn handle_connection(socket: WebSocket, ctx: GatewayContext) {
    let (mut sender, mut receiver) = socket.split();
    let mut access = AccessMachine::new();

    let token = match wait_for_identify(&mut receiver).await {
        Some(token) => token,
        None => {
            warn!("Gateway client failed to identify, closing");
            return;
        }
    };

    access.begin();
    if send_access(&mut sender, &access).await.is_err() {
        return;
    }

    // Listen before checking the session so a sign-out in between is not missed
    let revocations = ctx.dispatcher.watch_revocations();

    let claims = match session::authenticate(&ctx.db, &ctx.jwt_secret, &token).await {
        Ok(claims) => claims,
        Err(e) => {
            match e {
                SessionError::Store(_) => error!("Gateway sign-in failed: {}", e),
                _ => warn!("Gateway sign-in rejected: {}", e),
            }
            access.failed();
            let _ = send_access(&mut sender, &access).await;
            return;
        }
    };

    access.signed_in(&ctx.policy, &claims.email);
    if send_access(&mut sender, &access).await.is_err() {
        return;
    }

    run_session_loop(sender, receiver, &ctx, &claims, &mut access, revocations).await;
}

async fn wait_for_identify(receiver: &mut WsReceiver) -> Option<String> {
    let identify = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(GatewayCommand::Identify { token }) => return Some(token),
                    Ok(_) => warn!("Command before Identify ignored"),
                    Err(e) => warn!("Bad command before Identify: {}", e),
                }
            }
        }
        None
    };

    tokio::time::timeout(IDENTIFY_TIMEOUT, identify).await.ok().flatten()
}

async fn send_event(sender: &mut WsSender, event: &GatewayEvent) -> anyhow::Result<()> {
    let text = serde_json::to_string(event)?;
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}

async fn send_access(sender: &mut WsSender, access: &AccessMachine) -> anyhow::Result<()> {
    let event = GatewayEvent::AccessState {
        state: access.state(),
        email: access.email().map(str::to_string),
    };
    send_event(sender, &event).await
}

/// Drop back to signed out, say goodbye and close.
async fn end_session(sender: &mut WsSender, access: &mut AccessMachine) {
    access.sign_out();
    let _ = send_access(sender, access).await;
    let _ = send_event(sender, &GatewayEvent::SignedOut).await;
    let _ = sender.send(Message::Close(None)).await;
}

/// Revoke the session, then end it.
async fn sign_out(
    sender: &mut WsSender,
    ctx: &GatewayContext,
    claims: &Claims,
    access: &mut AccessMachine,
) {
    match session::revoke(&ctx.db, &ctx.dispatcher, claims).await {
        Ok(_) => info!("{} signed out", claims.email),
        Err(e) => warn!("Failed to revoke session for {}: {}", claims.email, e),
    }
    end_session(sender, access).await;
}

/// Next snapshot from an open subscription. Never resolves without one.
async fn next_snapshot(sub: &mut Option<Subscription>) -> Option<Snapshot> {
    match sub {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

enum Step {
    Snapshot(Snapshot),
    Command(GatewayCommand),
    Revoked,
    Recheck,
    Pong,
    Heartbeat,
    Closed,
    Ignore,
}

/// Serve a signed-in connection until it signs out, is revoked, or goes away.
///
/// Only an authorized identity gets subscriptions and dashboard renders; an
/// unauthorized one is kept alive by the heartbeat and may only sign out.
async fn run_session_loop(
    mut sender: WsSender,
    mut receiver: WsReceiver,
    ctx: &GatewayContext,
    claims: &Claims,
    access: &mut AccessMachine,
    mut revocations: broadcast::Receiver<Uuid>,
) {
    let conn_id = Uuid::new_v4();
    let authorized = access.is_authorized();

    // Both subscriptions live exactly as long as this loop
    let (mut waitlist, mut contacts) = if authorized {
        ctx.dispatcher.view_opened(conn_id, claims.email.clone()).await;
        info!("{} opened the admin dashboard", claims.email);
        (
            Some(ctx.source.subscribe(Collection::Waitlist)),
            Some(ctx.source.subscribe(Collection::Contacts)),
        )
    } else {
        (None, None)
    };
    let mut dashboard = Dashboard::new();

    let mut heartbeat = tokio::time::interval(ctx.heartbeat_interval);
    heartbeat.tick().await;
    let mut pong_received = true;
    let mut missed_heartbeats: u8 = 0;

    loop {
        let step = tokio::select! {
            Some(snapshot) = next_snapshot(&mut waitlist) => Step::Snapshot(snapshot),
            Some(snapshot) = next_snapshot(&mut contacts) => Step::Snapshot(snapshot),
            revoked = revocations.recv() => match revoked {
                Ok(sid) if sid == claims.sid => Step::Revoked,
                Ok(_) => Step::Ignore,
                Err(RecvError::Lagged(n)) => {
                    warn!("Revocation feed lagged by {} for {}, rechecking session", n, claims.email);
                    Step::Recheck
                }
                Err(RecvError::Closed) => Step::Closed,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => Step::Command(cmd),
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            claims.email,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                        Step::Ignore
                    }
                },
                Some(Ok(Message::Pong(_))) => Step::Pong,
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => Step::Closed,
                Some(Ok(_)) => Step::Ignore,
            },
            _ = heartbeat.tick() => Step::Heartbeat,
        };

        let sent = match step {
            Step::Snapshot(snapshot) => {
                dashboard.apply(snapshot);
                render(&mut sender, &dashboard).await
            }
            Step::Command(GatewayCommand::SignOut) => {
                sign_out(&mut sender, ctx, claims, access).await;
                break;
            }
            Step::Command(_) if !authorized => {
                warn!("{} is not authorized, command ignored", claims.email);
                Ok(())
            }
            Step::Command(GatewayCommand::Identify { .. }) => Ok(()), // Already handled
            Step::Command(GatewayCommand::SelectTab { tab }) => {
                dashboard.select_tab(tab);
                render(&mut sender, &dashboard).await
            }
            Step::Command(GatewayCommand::Search { term }) => {
                dashboard.set_search(term);
                render(&mut sender, &dashboard).await
            }
            Step::Command(GatewayCommand::Export) => {
                let export = dashboard.export(&ctx.export_prefix, chrono::Utc::now());
                info!("{} exported {}", claims.email, export.filename);
                let event = GatewayEvent::Export {
                    filename: export.filename,
                    content_type: export.content_type.to_string(),
                    csv: export.body,
                };
                send_event(&mut sender, &event).await
            }
            Step::Revoked => {
                info!("Session for {} was revoked, closing", claims.email);
                end_session(&mut sender, access).await;
                break;
            }
            Step::Recheck => match session::is_live(&ctx.db, claims.sid).await {
                Ok(true) => Ok(()),
                Ok(false) => {
                    info!("Session for {} is gone, closing", claims.email);
                    end_session(&mut sender, access).await;
                    break;
                }
                Err(e) => {
                    error!("Session recheck failed for {}: {}", claims.email, e);
                    Ok(())
                }
            },
            Step::Pong => {
                pong_received = true;
                Ok(())
            }
            Step::Heartbeat => {
                if std::mem::replace(&mut pong_received, false) {
                    missed_heartbeats = 0;
                } else {
                    missed_heartbeats += 1;
                    if missed_heartbeats >= 2 {
                        warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                        break;
                    }
                }
                sender
                    .send(Message::Ping(Vec::new().into()))
                    .await
                    .map_err(anyhow::Error::from)
            }
            Step::Closed => break,
            Step::Ignore => Ok(()),
        };

        if sent.is_err() {
            break;
        }
    }

    drop(waitlist);
    drop(contacts);
    if authorized {
        ctx.dispatcher.view_closed(conn_id).await;
        info!("{} left the admin dashboard", claims.email);
    }
}

async fn render(sender: &mut WsSender, dashboard: &Dashboard) -> anyhow::Result<()> {
    let view = dashboard.render(chrono::Utc::now());
    send_event(sender, &GatewayEvent::DashboardView(view)).await
}
