//! Live collection queries: each subscription yields the full, ordered
//! contents of one collection, first immediately and then after every change.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use fhiro_db::Database;
use fhiro_types::models::{Collection, Snapshot};

use crate::dispatcher::Dispatcher;

/// Snapshots buffered per subscription before the producer waits.
const SNAPSHOT_BUFFER: usize = 4;

/// Anything that can serve full-snapshot subscriptions, newest entry first.
pub trait SnapshotSource: Send + Sync {
    fn subscribe(&self, collection: Collection) -> Subscription;
}

/// A stream of snapshot replacements. Dropping it tears the subscription down.
pub struct Subscription {
    collection: Collection,
    rx: mpsc::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(collection: Collection, rx: mpsc::Receiver<Snapshot>, task: JoinHandle<()>) -> Self {
        Self { collection, rx, task }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Next full snapshot. `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!("{} subscription torn down", self.collection);
    }
}

/// Subscriptions backed by the SQLite store and the dispatcher's change feed.
#[derive(Clone)]
pub struct DbSnapshotSource {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl DbSnapshotSource {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> Self {
        Self { db, dispatcher }
    }
}

impl SnapshotSource for DbSnapshotSource {
    fn subscribe(&self, collection: Collection) -> Subscription {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        // Listen before the first read so no write slips between them
        let mut changes = self.dispatcher.subscribe();
        let db = self.db.clone();

        let task = tokio::spawn(async move {
            loop {
                let reader = db.clone();
                match tokio::task::spawn_blocking(move || reader.load_snapshot(collection)).await {
                    Ok(Ok(snapshot)) => {
                        if tx.send(snapshot).await.is_err() {
                            return;
                        }
                    }
                    Ok(Err(e)) => error!("Failed to load {} snapshot: {}", collection, e),
                    Err(e) => error!("spawn_blocking join error: {}", e),
                }

                // Park until this collection changes again
                loop {
                    match changes.recv().await {
                        Ok(event) if event.collection == collection => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(n)) => {
                            warn!("{} subscription lagged by {} changes, reloading", collection, n);
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        });

        debug!("{} subscription opened", collection);
        Subscription::new(collection, rx, task)
    }
}
