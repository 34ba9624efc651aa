use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::StorageConfig;
use crate::storage::{Storage, StorageError};

/// Periodically deletes uploads and exports that outlived the retention
/// window.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    storage: Arc<Storage>,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(storage: Arc<Storage>, max_age: Duration, interval: Duration) -> Self {
        Self {
            storage,
            max_age,
            interval,
        }
    }

    /// `None` when retention is disabled (`retention_secs = 0`).
    pub fn from_config(storage: Arc<Storage>, config: &StorageConfig) -> Option<Self> {
        if config.retention_secs == 0 {
            return None;
        }
        Some(Self::new(
            storage,
            Duration::from_secs(config.retention_secs),
            Duration::from_secs(config.sweep_interval_secs.max(1)),
        ))
    }

    /// Run a single sweep, returning the number of removed entries.
    pub async fn run_once(&self) -> Result<usize, StorageError> {
        let removed = self.storage.sweep(self.max_age).await?;
        if removed > 0 {
            tracing::info!(removed, "Swept expired uploads");
        } else {
            tracing::debug!("No expired uploads to sweep");
        }
        Ok(removed)
    }

    /// Start the sweep loop on the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Starting retention sweeper"
        );
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                interval.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::error!(error = %e, "Retention sweep failed");
                }
            }
        })
    }
}
