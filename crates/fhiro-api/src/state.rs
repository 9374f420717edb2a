use std::sync::Arc;
use std::time::Duration;

use fhiro_admin::access::AccessPolicy;
use fhiro_db::Database;
use fhiro_gateway::connection::{GatewayContext, HEARTBEAT_INTERVAL};
use fhiro_gateway::dispatcher::Dispatcher;
use fhiro_gateway::live::{DbSnapshotSource, SnapshotSource};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
    pub source: Arc<dyn SnapshotSource>,
    pub policy: Arc<AccessPolicy>,
    pub export_prefix: String,
    pub heartbeat_interval: Duration,
}

impl AppStateInner {
    /// Wire the store, change feed and live subscriptions together.
    pub fn new(
        db: Arc<Database>,
        jwt_secret: String,
        policy: AccessPolicy,
        export_prefix: String,
    ) -> AppState {
        Self::with_heartbeat(db, jwt_secret, policy, export_prefix, HEARTBEAT_INTERVAL)
    }

    /// Like `new`, with a custom gateway ping interval.
    pub fn with_heartbeat(
        db: Arc<Database>,
        jwt_secret: String,
        policy: AccessPolicy,
        export_prefix: String,
        heartbeat_interval: Duration,
    ) -> AppState {
        let dispatcher = Dispatcher::new();
        let source = Arc::new(DbSnapshotSource::new(db.clone(), dispatcher.clone()));
        Arc::new(Self {
            db,
            jwt_secret,
            dispatcher,
            source,
            policy: Arc::new(policy),
            export_prefix,
            heartbeat_interval,
        })
    }

    pub fn gateway_context(&self) -> GatewayContext {
        GatewayContext {
            db: self.db.clone(),
            dispatcher: self.dispatcher.clone(),
            source: self.source.clone(),
            policy: self.policy.clone(),
            jwt_secret: self.jwt_secret.clone(),
            export_prefix: self.export_prefix.clone(),
            heartbeat_interval: self.heartbeat_interval,
        }
    }

    /// Run blocking DB work off the async runtime.
    pub async fn with_db<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
            .map_err(ApiError::Internal)
    }
}
