//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Telemetry readings and snapshots handed to consumers."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classify::Status;
use crate::parameters::ParameterId;
use crate::scenarios::ActiveScenario;
use crate::trend::{Direction, Trend};

/// Current state of one simulated parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub parameter: ParameterId,
    pub value: f64,
    pub display: String,
    pub status: Status,
    pub trend: Trend,
}

impl TelemetryReading {
    pub fn inactive(parameter: ParameterId) -> Self {
        let spec = parameter.spec();
        Self {
            parameter,
            value: spec.baseline,
            display: spec.format_value(spec.baseline),
            status: Status::Inactive,
            trend: Trend::flat(),
        }
    }
}

/// Read-only view of all readings after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub tick: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub readings: IndexMap<ParameterId, TelemetryReading>,
    pub active_scenarios: Vec<ActiveScenario>,
}

impl TelemetrySnapshot {
    pub fn reading(&self, parameter: ParameterId) -> Option<&TelemetryReading> {
        self.readings.get(&parameter)
    }

    /// Flatten into one row per parameter for tabular export.
    pub fn rows(&self) -> Vec<TelemetryRow> {
        let scenarios = self
            .active_scenarios
            .iter()
            .map(|scenario| scenario.kind.to_string())
            .collect::<Vec<_>>()
            .join(";");
        self.readings
            .values()
            .map(|reading| TelemetryRow {
                tick: self.tick,
                timestamp: self.timestamp,
                parameter: reading.parameter,
                value: reading.value,
                status: reading.status,
                trend_direction: reading.trend.direction,
                trend_magnitude: reading.trend.magnitude,
                scenarios: scenarios.clone(),
            })
            .collect()
    }
}

/// Flat CSV/JSON record of a single reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub tick: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub parameter: ParameterId,
    pub value: f64,
    pub status: Status,
    pub trend_direction: Direction,
    pub trend_magnitude: f64,
    pub scenarios: String,
}
