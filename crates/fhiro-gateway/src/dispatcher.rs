use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

use fhiro_types::models::Collection;

/// A collection received a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub collection: Collection,
}

/// Fans out store changes to live subscriptions and tracks open admin views.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Every subscription task listens here and filters by collection
    changes_tx: broadcast::Sender<StoreEvent>,

    /// Session ids revoked by sign-out, wherever it happened
    revoked_tx: broadcast::Sender<Uuid>,

    /// Open dashboard views: conn_id -> admin email
    views: RwLock<HashMap<Uuid, String>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (changes_tx, _) = broadcast::channel(1024);
        let (revoked_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(DispatcherInner {
                changes_tx,
                revoked_tx,
                views: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Listen for store changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.changes_tx.subscribe()
    }

    /// Announce a write to `collection`. Nobody listening is fine.
    pub fn notify(&self, collection: Collection) {
        let listeners = self.inner.changes_tx.send(StoreEvent { collection }).unwrap_or(0);
        debug!("{} changed, {} listeners notified", collection, listeners);
    }

    /// Number of live change listeners (one per open subscription).
    pub fn listener_count(&self) -> usize {
        self.inner.changes_tx.receiver_count()
    }

    /// Listen for session revocations.
    pub fn watch_revocations(&self) -> broadcast::Receiver<Uuid> {
        self.inner.revoked_tx.subscribe()
    }

    /// Tell every open connection that session `sid` is gone.
    pub fn session_revoked(&self, sid: Uuid) {
        let listeners = self.inner.revoked_tx.send(sid).unwrap_or(0);
        debug!("Session {} revoked, {} connections told", sid, listeners);
    }

    pub async fn view_opened(&self, conn_id: Uuid, email: String) {
        self.inner.views.write().await.insert(conn_id, email);
    }

    pub async fn view_closed(&self, conn_id: Uuid) {
        self.inner.views.write().await.remove(&conn_id);
    }

    /// Open dashboard views as (conn_id, email).
    pub async fn active_views(&self) -> Vec<(Uuid, String)> {
        self.inner
            .views
            .read()
            .await
            .iter()
            .map(|(id, email)| (*id, email.clone()))
            .collect()
    }
}
