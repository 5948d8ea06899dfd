//! services/api/src/client.rs
//!
//! Wires the offline-first store to a FocusPoint server: the local snapshot,
//! a background worker replicating every write to `/profile`, and remote
//! sign-out on logout.

use crate::adapters::RemoteAccount;
use focuspoint_core::{
    Clock, ProfileRepository, SessionService, SnapshotStore, Store, StoreResult, SyncOutbox,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long [`SyncedStore::close`] waits for queued writes to reach the server.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SyncedStore {
    store: Store,
    worker: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl SyncedStore {
    /// Opens the local snapshot for the account's user, starts the sync worker
    /// and pulls the server's copy of the profile.
    pub async fn open(
        local: Box<dyn SnapshotStore>,
        account: Arc<RemoteAccount>,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        let (outbox, worker) = SyncOutbox::channel();
        let cancellation_token = CancellationToken::new();
        let worker = worker.spawn(account.clone() as Arc<dyn ProfileRepository>, cancellation_token.clone());

        let mut store = Store::open(local, outbox, clock, Some(account.clone() as Arc<dyn SessionService>))?;
        store.set_user(Some(account.user().clone()))?;
        let hydrated = store.hydrate_from_remote(account.as_ref()).await?;
        info!(user_id = %account.user().user_id, hydrated, "Synced store ready");

        Ok(Self { store, worker, cancellation_token })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Closes the outbox and waits for the worker to push what is queued.
    /// Writes still pending after [`DRAIN_TIMEOUT`] are abandoned.
    pub async fn close(self) {
        let Self { store, mut worker, cancellation_token } = self;
        drop(store);
        match tokio::time::timeout(DRAIN_TIMEOUT, &mut worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Sync worker failed"),
            Err(_) => {
                warn!("Sync worker did not drain in time, cancelling");
                cancellation_token.cancel();
                if let Err(e) = worker.await {
                    warn!(error = %e, "Sync worker failed");
                }
            }
        }
    }
}
