mod config;

use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use fhiro_admin::access::AccessPolicy;
use fhiro_api::routes::router;
use fhiro_api::state::AppStateInner;
use fhiro_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fhiro=debug,fhiro_api=debug,fhiro_gateway=debug,fhiro_admin=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    let policy = AccessPolicy::new(config.admin_emails.iter().cloned());
    if policy.is_empty() {
        warn!("FHIRO_ADMIN_EMAILS is empty: nobody can open the admin dashboard");
    }
    for email in config.unreachable_admins() {
        warn!("Admin entry '{}' is not lower-case and will never match a signed-in identity", email);
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    let state = AppStateInner::new(
        db,
        config.jwt_secret.clone(),
        policy,
        config.export_prefix.clone(),
    );

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_str(origin)?))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        None => CorsLayer::permissive(),
    };

    let app = router(state).layer(cors);

    info!("Fhiro server listening on {}", config.addr);
    info!("{} admin(s) configured", config.admin_emails.len());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
