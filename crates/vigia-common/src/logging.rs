//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Tracing setup shared by the daemon and its offline commands."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "VIGIA_LOG";
/// Tick-level events sit at `debug`/`trace`, so the monitor stays quiet by default.
const DEFAULT_DIRECTIVE: &str = "info";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static STDOUT_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Console rendering for the monitor's log stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    StructuredJson,
    Pretty,
}

/// Install the global subscriber for `service_name`.
///
/// The filter comes from `VIGIA_LOG`, then `RUST_LOG`, then `info`; an
/// unparsable `VIGIA_LOG` falls back to `info` with a note on stderr. Stdout
/// follows [`LogFormat`] while `<prefix>.log` in the configured directory always
/// receives JSON, rotated daily. Calling this twice keeps the first subscriber.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "unable to create log directory {}",
            config.directory.display()
        )
    })?;

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(daily(&config.directory, log_file_name(service_name, config)));
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let _ = FILE_GUARD.set(file_guard);
    let _ = STDOUT_GUARD.set(stdout_guard);

    let filter = resolve_filter(std::env::var(LOG_ENV).ok());
    let installed = Registry::default()
        .with(filter)
        .with(console_layer(config.format, stdout_writer))
        .with(journal_layer(file_writer))
        .try_init()
        .is_ok();

    info!(
        service = %service_name,
        log_file = %log_path(service_name, config).display(),
        format = ?config.format,
        installed,
        "tracing initialised"
    );
    Ok(())
}

/// Daily file name stem for `service_name`, honouring `file_prefix`.
pub fn log_file_name(service_name: &str, config: &LoggingConfig) -> String {
    let prefix = config.file_prefix.as_deref().unwrap_or(service_name);
    format!("{prefix}.log")
}

fn log_path(service_name: &str, config: &LoggingConfig) -> PathBuf {
    config.directory.join(log_file_name(service_name, config))
}

/// Filter for an optional `VIGIA_LOG` directive.
pub fn resolve_filter(directive: Option<String>) -> EnvFilter {
    match directive {
        Some(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive {directive:?} ({err}); using {DEFAULT_DIRECTIVE}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

fn console_layer<S>(format: LogFormat, writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = fmt::layer().with_timer(fmt::time::UtcTime::rfc_3339());
    match format {
        LogFormat::StructuredJson => layer.with_target(false).json().with_writer(writer).boxed(),
        LogFormat::Pretty => layer.with_target(true).with_writer(writer).boxed(),
    }
}

// The journal keeps full targets so alerts can be traced back to their crate.
fn journal_layer<S>(writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .json()
        .with_writer(writer)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_prefers_configured_prefix() {
        let mut config = LoggingConfig::default();
        assert_eq!(log_file_name("vigiad", &config), "vigiad.log");
        config.file_prefix = Some("rig-7".to_owned());
        assert_eq!(log_file_name("vigiad", &config), "rig-7.log");
    }

    #[test]
    fn explicit_directive_is_used_verbatim() {
        let filter = resolve_filter(Some("vigia_sim=trace".to_owned()));
        assert!(filter.to_string().contains("vigia_sim=trace"));
    }

    #[test]
    fn unparsable_directive_falls_back_to_info() {
        let filter = resolve_filter(Some("vigia_sim=loud".to_owned()));
        assert_eq!(filter.to_string(), DEFAULT_DIRECTIVE);
    }
}
