//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "01-bootstrap"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Simulation runtime module exports and shared types."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
//! Continuous telemetry simulation and threshold alerting for the Vigia rig
//! monitor.
//!
//! Data flows from the [`generators`] (one per parameter, run in dependency
//! order) through the [`scenarios`] board, into the [`classify`] and [`trend`]
//! stages and finally the [`alerts`] formatter. [`engine`] ties these into a
//! single tick transition.

pub mod alerts;
pub mod classify;
pub mod engine;
pub mod frames;
pub mod generators;
pub mod parameters;
pub mod scenarios;
pub mod synthetic;
pub mod trend;

pub use alerts::{Alert, Priority};
pub use classify::{classify, Status, Tier};
pub use engine::{HeadlessRun, MonitorState, SimulationEngine, TickDraws, TickReport};
pub use frames::{TelemetryReading, TelemetryRow, TelemetrySnapshot};
pub use generators::{SignalSample, SignalSet};
pub use parameters::{ParameterId, ParameterSpec, Polarity, ThresholdPair};
pub use scenarios::{
    ActiveScenario, Modifier, ScenarioBoard, ScenarioClass, ScenarioEvent, ScenarioKind,
};
pub use synthetic::{AlertCategory, SyntheticAlertSource};
pub use trend::{Direction, Trend};
