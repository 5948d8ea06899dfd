//! crates/focuspoint_core/src/outbox.rs
//!
//! Fire-and-forget replication of the local snapshot to the remote profile store.
//!
//! The store pushes a [`SyncRecord`] after every successful local write. A
//! [`SyncWorker`] drains the queue in order and upserts each record; failures
//! are logged and dropped, never surfaced to the mutation that caused them.

use crate::domain::ProfileRecord;
use crate::ports::ProfileRepository;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One full-snapshot upsert for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord {
    pub user_id: Uuid,
    pub record: ProfileRecord,
}

/// Sending half of the outbox. Cheap to clone; enqueueing never blocks.
#[derive(Debug, Clone, Default)]
pub struct SyncOutbox {
    tx: Option<mpsc::UnboundedSender<SyncRecord>>,
}

impl SyncOutbox {
    /// Creates a connected outbox and the worker that drains it.
    pub fn channel() -> (Self, SyncWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, SyncWorker { rx })
    }

    /// An outbox with no worker: records are dropped.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, record: SyncRecord) {
        let Some(tx) = &self.tx else {
            debug!(user_id = %record.user_id, "No sync worker attached, dropping record");
            return;
        };
        if tx.send(record).is_err() {
            debug!("Sync worker has stopped, dropping record");
        }
    }
}

/// Receiving half of the outbox.
#[derive(Debug)]
pub struct SyncWorker {
    rx: mpsc::UnboundedReceiver<SyncRecord>,
}

impl SyncWorker {
    /// Upserts queued records in order until cancelled or every sender is gone.
    pub async fn run(mut self, repo: Arc<dyn ProfileRepository>, cancellation_token: CancellationToken) {
        info!("Sync worker started.");
        loop {
            let next = tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Sync worker cancelled.");
                    break;
                }
                next = self.rx.recv() => next,
            };
            let Some(SyncRecord { user_id, record }) = next else {
                info!("Sync outbox closed, worker exiting.");
                break;
            };
            match repo.upsert_profile(user_id, &record).await {
                Ok(()) => debug!(%user_id, "Profile synced"),
                Err(e) => warn!(%user_id, error = %e, "Profile sync failed"),
            }
        }
    }

    pub fn spawn(self, repo: Arc<dyn ProfileRepository>, cancellation_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(repo, cancellation_token))
    }
}
