//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "binary"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Operator commands for the persisted alert feed."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;
use uuid::Uuid;
use vigia_common::config::AlertFeedConfig;
use vigia_persistence::{AlertFeed, FileStore, PersistenceError};
use vigia_sim::Alert;

#[derive(Debug, Clone, Subcommand)]
pub enum AlertCommand {
    #[command(about = "List persisted alerts, newest first")]
    List {
        /// Emit the raw JSON feed instead of a table
        #[arg(long)]
        json: bool,
        /// Hide acknowledged alerts
        #[arg(long)]
        unacknowledged: bool,
    },
    #[command(about = "Mark an alert as acknowledged")]
    Ack { id: Uuid },
    #[command(about = "Remove every persisted alert")]
    Clear,
}

pub fn open_feed(config: &AlertFeedConfig) -> Result<AlertFeed<FileStore>> {
    let store = FileStore::open(&config.directory).with_context(|| {
        format!(
            "failed to open alert store at {}",
            config.directory.display()
        )
    })?;
    Ok(AlertFeed::with_options(store, &config.key, config.capacity))
}

pub fn execute<W: Write>(
    command: &AlertCommand,
    feed: &AlertFeed<FileStore>,
    out: &mut W,
) -> Result<()> {
    match command {
        AlertCommand::List {
            json,
            unacknowledged,
        } => {
            let alerts: Vec<Alert> = feed
                .load()
                .context("failed to read alert feed")?
                .into_iter()
                .filter(|alert| !*unacknowledged || !alert.acknowledged)
                .collect();
            if *json {
                serde_json::to_writer_pretty(&mut *out, &alerts)?;
                writeln!(out)?;
            } else if alerts.is_empty() {
                writeln!(out, "no alerts")?;
            } else {
                for alert in &alerts {
                    writeln!(out, "{}", render_line(alert))?;
                }
            }
        }
        AlertCommand::Ack { id } => match feed.acknowledge(*id) {
            Ok(alert) => writeln!(out, "acknowledged {}: {}", alert.id, alert.message)?,
            Err(PersistenceError::AlertNotFound(id)) => {
                anyhow::bail!("no alert with id {id} in the feed")
            }
            Err(err) => return Err(err).context("failed to acknowledge alert"),
        },
        AlertCommand::Clear => {
            feed.clear().context("failed to clear alert feed")?;
            writeln!(out, "alert feed cleared")?;
        }
    }
    Ok(())
}

fn render_line(alert: &Alert) -> String {
    format!(
        "{}  {}  {:<8}  {}  {}",
        alert.id,
        alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
        alert.priority,
        if alert.acknowledged { "ack" } else { "new" },
        alert.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;
    use vigia_sim::{alerts::format_transition, ParameterId, Tier};

    fn feed_in(dir: &std::path::Path) -> AlertFeed<FileStore> {
        let config = AlertFeedConfig {
            directory: dir.to_path_buf(),
            ..AlertFeedConfig::default()
        };
        open_feed(&config).unwrap()
    }

    fn seal_alert() -> Alert {
        format_transition(
            ParameterId::SealIntegrity,
            Some(Tier::Warning),
            Tier::Alert,
            78.5,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn list_ack_and_clear() {
        let dir = tempdir().unwrap();
        let feed = feed_in(dir.path());
        let alert = seal_alert();
        feed.append(alert.clone()).unwrap();

        let mut out = Vec::new();
        execute(&AlertCommand::List { json: false, unacknowledged: false }, &feed, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Seal Integrity at 78.5% has fallen below alert threshold of 80.0%"));
        assert!(text.contains("new"));

        let mut out = Vec::new();
        execute(&AlertCommand::Ack { id: alert.id }, &feed, &mut out).unwrap();
        assert!(feed.load().unwrap()[0].acknowledged);

        let mut out = Vec::new();
        execute(&AlertCommand::List { json: false, unacknowledged: true }, &feed, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "no alerts");

        let mut out = Vec::new();
        execute(&AlertCommand::Clear, &feed, &mut out).unwrap();
        assert!(feed.load().unwrap().is_empty());
    }

    #[test]
    fn ack_unknown_id_fails() {
        let dir = tempdir().unwrap();
        let feed = feed_in(dir.path());
        let mut out = Vec::new();
        let err = execute(&AlertCommand::Ack { id: Uuid::new_v4() }, &feed, &mut out).unwrap_err();
        assert!(err.to_string().contains("no alert with id"));
    }

    #[test]
    fn json_listing_round_trips() {
        let dir = tempdir().unwrap();
        let feed = feed_in(dir.path());
        feed.append(seal_alert()).unwrap();
        let mut out = Vec::new();
        execute(&AlertCommand::List { json: true, unacknowledged: false }, &feed, &mut out).unwrap();
        let parsed: Vec<Alert> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
