//! ---
//! vigia_section: "15-testing-qa-runbook"
//! vigia_subsection: "integration-tests"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Alert feed behaviour against the on-disk store."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::fs;
use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use uuid::Uuid;
use vigia_persistence::{AlertFeed, FileStore, KeyValueStore, PersistenceError, DEFAULT_FEED_KEY};
use vigia_sim::{alerts::format_transition, ParameterId, Tier};

fn threshold_alert(minute: u32) -> vigia_sim::Alert {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, minute, 0).unwrap();
    format_transition(ParameterId::GasDetection, Some(Tier::Normal), Tier::Alert, 38.0, at)
        .expect("normal to alert raises an alert")
}

#[test]
fn feed_survives_reopen_and_stays_capped() -> Result<()> {
    let dir = tempdir()?;
    {
        let feed = AlertFeed::new(FileStore::open(dir.path())?);
        for minute in 0..30 {
            feed.append(threshold_alert(minute))?;
        }
    }

    let feed = AlertFeed::new(FileStore::open(dir.path())?);
    let alerts = feed.load()?;
    assert_eq!(alerts.len(), 20);
    assert!(alerts
        .windows(2)
        .all(|pair| pair[0].timestamp > pair[1].timestamp));
    assert!(alerts[0].message.starts_with("Gas Detection"));
    Ok(())
}

#[test]
fn shared_store_sees_acknowledgements() -> Result<()> {
    let dir = tempdir()?;
    let store = Arc::new(FileStore::open(dir.path())?);
    let writer = AlertFeed::new(Arc::clone(&store));
    let reader = AlertFeed::new(Arc::clone(&store));

    let alert = threshold_alert(5);
    let id = alert.id;
    writer.append(alert)?;
    reader.acknowledge(id)?;

    let seen = writer.load()?;
    assert!(seen[0].acknowledged);
    assert!(matches!(
        writer.acknowledge(Uuid::new_v4()),
        Err(PersistenceError::AlertNotFound(_))
    ));
    Ok(())
}

#[test]
fn corrupt_file_is_replaced_on_reset() -> Result<()> {
    let dir = tempdir()?;
    let store = FileStore::open(dir.path())?;
    fs::write(dir.path().join(format!("{DEFAULT_FEED_KEY}.json")), "[{\"id\":")?;

    let feed = AlertFeed::new(store.clone());
    assert!(matches!(feed.load(), Err(PersistenceError::Corrupt { .. })));
    assert!(feed.load_or_reset()?.is_empty());
    assert_eq!(store.get(DEFAULT_FEED_KEY)?.as_deref(), Some("[]"));
    Ok(())
}
