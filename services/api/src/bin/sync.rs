//! services/api/src/bin/sync.rs
//!
//! Command-line companion to the server. Signs in, pulls the remote profile
//! into the local snapshot, records today's visit and pushes the result back.
//! `sync logout` clears the local snapshot and ends the session instead.

use api_lib::{
    adapters::RemoteAccount,
    client::SyncedStore,
    config::{ClientConfig, ConfigError},
    error::ApiError,
};
use focuspoint_core::{Clock, JsonFileSnapshotStore, SystemClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = ClientConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let logout = match std::env::args().nth(1).as_deref() {
        None => false,
        Some("logout") => true,
        Some(other) => {
            return Err(ConfigError::InvalidValue(
                "command".to_string(),
                format!("unknown command '{other}', expected nothing or 'logout'"),
            )
            .into())
        }
    };

    let account = Arc::new(RemoteAccount::login(&config.server_url, &config.email, &config.password).await?);
    let local = Box::new(JsonFileSnapshotStore::new(config.state_path.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut synced = SyncedStore::open(local, account, clock).await?;

    if logout {
        synced.store_mut().logout().await?;
        synced.close().await;
        println!("Signed out, local data cleared.");
        return Ok(());
    }

    let streak = synced.store_mut().update_streak()?;
    let store = synced.store();
    println!(
        "{} tasks, {} schedule events, {} notes, {} due for review. Streak: {} day(s).",
        store.tasks().len(),
        store.schedule().len(),
        store.notes().len(),
        store.due_reviews().len(),
        streak
    );
    synced.close().await;
    info!(path = %config.state_path.display(), "Sync finished");
    Ok(())
}
