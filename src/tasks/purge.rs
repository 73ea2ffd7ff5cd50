//! Hard-Delete Purge Task
//!
//! Background task that periodically removes entries past their hard-delete
//! instant. Reads already remove such entries lazily; this reclaims space for
//! keys nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::SharedCache;

/// Spawns a background task that periodically purges hard-expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs. It holds the cache write lock for the duration of a run.
///
/// # Arguments
/// * `cache` - shared reference to the request cache
/// * `purge_interval_secs` - Interval in seconds between purge runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_purge_task(cache: SharedCache, purge_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(purge_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting purge task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let result = {
                let mut cache_guard = cache.write().await;
                cache_guard.purge_expired()
            };

            match result {
                Ok(0) => debug!("Purge: no hard-expired entries found"),
                Ok(removed) => info!("Purge: removed {} hard-expired entries", removed),
                Err(err) => warn!("Purge failed: {}", err),
            }
        }
    })
}
