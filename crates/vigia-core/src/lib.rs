//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Primary orchestration and lifecycle management."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
//! Timer-driven monitoring runtime: owns the simulation engine, delivers its
//! output over a broadcast channel and feeds raised alerts into persistence.

pub mod integration_persistence;
pub mod monitor;

pub use integration_persistence::{AlertFeedBridge, SharedStore};
pub use monitor::{MonitorEvent, MonitorHandle, MonitorRuntime};
