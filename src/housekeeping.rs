use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::{AppState, SharedState};
use crate::store::StoreError;

/// Spawn the cleanup loop. It runs once per configured interval until
/// `shutdown` flips to `true`.
pub fn spawn(state: SharedState, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

/// Join the cleanup task, logging a panic or cancellation instead of dropping it.
pub async fn wait(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        tracing::error!("Housekeeping task failed: {e}");
    }
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(state.config.housekeeping_interval_secs);
    tracing::debug!("Housekeeping started, interval {interval:?}");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match remove_not_activated_users(&state, Utc::now()).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!("Removed {removed} not activated users"),
            Err(e) => tracing::error!("Housekeeping error: {e}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!("Housekeeping stopped");
}

/// Delete users that hold an activation key, are not activated, and were
/// created more than the configured number of days before `now`.
pub async fn remove_not_activated_users(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let cutoff = now - chrono::Duration::days(state.config.unactivated_user_ttl_days);
    let stale = state
        .stores
        .users
        .find_unactivated_created_before(cutoff)
        .await?;

    for user in &stale {
        tracing::debug!("Deleting not activated user {}", user.login);
        state.lookup.delete_user(user).await?;
    }

    Ok(stale.len())
}
