//! ---
//! vigia_section: "03-persistence-logging"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Persistence abstractions and storage bindings."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Storage for state shared across monitoring views: a swappable
//! [`KeyValueStore`] and the capped [`AlertFeed`] kept on top of it.

/// Result alias used throughout the persistence crate.
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Error type for the persistence subsystem.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Wrapper for IO errors encountered while reading/writing store files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization issues on write.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Stored value exists but cannot be decoded.
    #[error("corrupt value under key '{key}': {source}")]
    Corrupt {
        /// Key whose value failed to decode.
        key: String,
        /// Underlying decode failure.
        source: serde_json::Error,
    },
    /// Key contains characters that cannot be mapped onto the backing store.
    #[error("invalid store key '{0}'")]
    InvalidKey(String),
    /// Acknowledgement targeted an alert that is not in the feed.
    #[error("alert {0} not found")]
    AlertNotFound(uuid::Uuid),
}

pub mod feed;
pub mod store;

pub use feed::{AlertFeed, DEFAULT_FEED_CAPACITY, DEFAULT_FEED_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_key() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = PersistenceError::Corrupt {
            key: "vigia-alerts".into(),
            source,
        };
        assert!(format!("{err}").starts_with("corrupt value under key 'vigia-alerts'"));
    }
}
