//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Bridge between the monitoring loop and the persisted alert feed."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use uuid::Uuid;
use vigia_common::config::AlertFeedConfig;
use vigia_metrics::MonitorMetrics;
use vigia_persistence::{AlertFeed, FileStore, KeyValueStore, PersistenceError};
use vigia_sim::Alert;

/// Store handle shared between the runtime and any other feed readers.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Appends raised alerts to the persisted feed without ever failing the loop.
pub struct AlertFeedBridge {
    feed: AlertFeed<SharedStore>,
    metrics: Option<MonitorMetrics>,
}

impl std::fmt::Debug for AlertFeedBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertFeedBridge")
            .field("key", &self.feed.key())
            .field("capacity", &self.feed.capacity())
            .finish()
    }
}

impl AlertFeedBridge {
    pub fn new(store: SharedStore, key: &str, capacity: usize) -> Self {
        Self {
            feed: AlertFeed::with_options(store, key, capacity),
            metrics: None,
        }
    }

    /// Open the file-backed feed described by `config`.
    pub fn from_config(config: &AlertFeedConfig) -> Result<Self> {
        let store = FileStore::open(&config.directory).with_context(|| {
            format!(
                "failed to open alert store at {}",
                config.directory.display()
            )
        })?;
        Ok(Self::new(Arc::new(store), &config.key, config.capacity))
    }

    pub fn with_metrics(mut self, metrics: Option<MonitorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Drop unreadable data left by an earlier run so appends start clean.
    pub fn recover(&self) {
        match self.feed.load_or_reset() {
            Ok(alerts) => {
                debug!(key = self.feed.key(), retained = alerts.len(), "alert feed ready");
                self.observe_size(alerts.len());
            }
            Err(err) => warn!(key = self.feed.key(), error = %err, "alert feed unavailable"),
        }
    }

    pub fn record(&self, alerts: &[Alert]) {
        if alerts.is_empty() {
            return;
        }
        match self.feed.append_all(alerts.to_vec()) {
            Ok(feed) => self.observe_size(feed.len()),
            Err(err) => {
                warn!(key = self.feed.key(), count = alerts.len(), error = %err, "failed to persist alerts")
            }
        }
    }

    pub fn acknowledge(&self, id: Uuid) -> Result<Option<Alert>> {
        match self.feed.acknowledge(id) {
            Ok(alert) => Ok(Some(alert)),
            Err(PersistenceError::AlertNotFound(_)) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to acknowledge alert {id}")),
        }
    }

    pub fn recent(&self) -> Result<Vec<Alert>> {
        self.feed.load().context("failed to read alert feed")
    }

    fn observe_size(&self, size: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.set_feed_size(size);
        }
    }
}
