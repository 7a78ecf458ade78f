//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Shared primitives and utilities for the monitoring runtime."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
//! Core shared primitives for the Vigia workspace.
//! This crate exposes configuration loading, logging, and loop timing
//! utilities consumed by the simulation runtime and the daemon.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod time;

pub use config::{
    AlertFeedConfig, AppConfig, LoadedAppConfig, LoggingConfig, MetricsConfig, SimulationConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{JitterHistogram, JitterSummary, LoopTimingReporter};
