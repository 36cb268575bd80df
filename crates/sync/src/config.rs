//! Synchronizer configuration.

use std::time::Duration;

/// Tunables for catch-up downloads.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long the runner waits for one peer's chain response before the
    /// fetch counts as failed and the next candidate peer is tried.
    pub fetch_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
        }
    }
}
