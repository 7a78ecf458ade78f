//! ---
//! vigia_section: "03-persistence-logging"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Persistence abstractions and storage bindings."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use tracing::{debug, warn};
use uuid::Uuid;
use vigia_sim::Alert;

use crate::store::KeyValueStore;
use crate::{PersistenceError, Result};

/// Key the alert feed is stored under by default.
pub const DEFAULT_FEED_KEY: &str = "vigia-alerts";
/// Maximum number of alerts retained by default.
pub const DEFAULT_FEED_CAPACITY: usize = 20;

/// Capped, newest-first alert list persisted as one JSON array.
///
/// Every mutation reads the whole collection, modifies it and writes it back.
/// Two writers sharing a backing store can overwrite each other's appends.
#[derive(Debug)]
pub struct AlertFeed<S> {
    store: S,
    key: String,
    capacity: usize,
}

impl<S: KeyValueStore> AlertFeed<S> {
    /// Feed on `store` with the default key and capacity.
    pub fn new(store: S) -> Self {
        Self::with_options(store, DEFAULT_FEED_KEY, DEFAULT_FEED_CAPACITY)
    }

    /// Feed with an explicit key and capacity (minimum one).
    pub fn with_options(store: S, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of retained alerts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Storage key of the feed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current alerts, newest first.
    pub fn load(&self) -> Result<Vec<Alert>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
            key: self.key.clone(),
            source,
        })
    }

    /// Like [`load`](Self::load), but a corrupt document is replaced by an empty feed.
    pub fn load_or_reset(&self) -> Result<Vec<Alert>> {
        match self.load() {
            Err(PersistenceError::Corrupt { key, source }) => {
                warn!(key = %key, error = %source, "alert feed unreadable; resetting");
                self.save(&[])?;
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Prepend `alert`, evicting the oldest entries beyond capacity.
    pub fn append(&self, alert: Alert) -> Result<Vec<Alert>> {
        self.append_all(vec![alert])
    }

    /// Prepend a batch; the last element of `alerts` ends up newest.
    pub fn append_all(&self, alerts: Vec<Alert>) -> Result<Vec<Alert>> {
        if alerts.is_empty() {
            return self.load_or_reset();
        }
        let mut feed = self.load_or_reset()?;
        let added = alerts.len();
        for alert in alerts {
            feed.insert(0, alert);
        }
        let evicted = feed.len().saturating_sub(self.capacity);
        feed.truncate(self.capacity);
        self.save(&feed)?;
        debug!(key = %self.key, added, evicted, retained = feed.len(), "alert feed updated");
        Ok(feed)
    }

    /// Set the acknowledged flag on alert `id`.
    pub fn acknowledge(&self, id: Uuid) -> Result<Alert> {
        let mut feed = self.load()?;
        let alert = feed
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or(PersistenceError::AlertNotFound(id))?;
        alert.acknowledge();
        let acknowledged = alert.clone();
        self.save(&feed)?;
        Ok(acknowledged)
    }

    /// Number of alerts not yet acknowledged.
    pub fn unacknowledged(&self) -> Result<usize> {
        Ok(self
            .load()?
            .iter()
            .filter(|alert| !alert.acknowledged)
            .count())
    }

    /// Drop every alert.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }

    fn save(&self, alerts: &[Alert]) -> Result<()> {
        let json = serde_json::to_string(alerts)?;
        self.store.put(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use vigia_sim::Priority;

    fn alert(message: &str) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            source: "test".into(),
            parameter: None,
            timestamp: Utc::now(),
            message: message.into(),
            value: 1.0,
            threshold: 0.5,
            priority: Priority::Medium,
            acknowledged: false,
            related: Vec::new(),
        }
    }

    #[test]
    fn newest_first_and_capped() {
        let feed = AlertFeed::with_options(MemoryStore::new(), "alerts", 3);
        for index in 0..5 {
            feed.append(alert(&format!("alert {index}"))).unwrap();
        }
        let messages: Vec<_> = feed
            .load()
            .unwrap()
            .into_iter()
            .map(|alert| alert.message)
            .collect();
        assert_eq!(messages, vec!["alert 4", "alert 3", "alert 2"]);
    }

    #[test]
    fn acknowledge_sets_flag_only() {
        let feed = AlertFeed::new(MemoryStore::new());
        let original = alert("gas");
        let id = original.id;
        feed.append(original.clone()).unwrap();
        assert_eq!(feed.unacknowledged().unwrap(), 1);
        let acked = feed.acknowledge(id).unwrap();
        assert!(acked.acknowledged);
        assert_eq!(acked.message, original.message);
        assert_eq!(feed.unacknowledged().unwrap(), 0);
        assert!(matches!(
            feed.acknowledge(Uuid::new_v4()),
            Err(PersistenceError::AlertNotFound(_))
        ));
    }

    #[test]
    fn corrupt_document_is_reported_then_reset() {
        let store = MemoryStore::new();
        store.put(DEFAULT_FEED_KEY, "{not json").unwrap();
        let feed = AlertFeed::new(store);
        assert!(matches!(feed.load(), Err(PersistenceError::Corrupt { .. })));
        assert!(feed.load_or_reset().unwrap().is_empty());
        assert!(feed.load().unwrap().is_empty());
        feed.append(alert("after reset")).unwrap();
        assert_eq!(feed.load().unwrap().len(), 1);
    }

    #[test]
    fn clear_empties_feed() {
        let feed = AlertFeed::new(MemoryStore::new());
        feed.append(alert("x")).unwrap();
        feed.clear().unwrap();
        assert!(feed.load().unwrap().is_empty());
    }
}
