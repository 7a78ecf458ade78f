//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Tick state transition and the randomised simulation engine."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
//! [`MonitorState::advance`] is the deterministic transition: every random input
//! arrives through [`TickDraws`]. [`SimulationEngine`] owns the RNG, samples
//! those inputs and exposes one method per timer cadence.
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};
use vigia_common::config::SimulationConfig;
use vigia_common::time::{hour_of_day, ticks_per};

use crate::alerts::{format_transition, link_related, Alert};
use crate::classify::{classify, Status};
use crate::frames::{TelemetryReading, TelemetrySnapshot};
use crate::generators::{advance_all, SignalSample, SignalSet};
use crate::parameters::ParameterId;
use crate::scenarios::{ScenarioBoard, ScenarioEvent};
use crate::synthetic::SyntheticAlertSource;
use crate::trend::{Trend, TrendBaseline};

const PARAMETER_COUNT: usize = 6;

/// Random inputs for one tick, indexed like [`ParameterId::all`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickDraws {
    pub samples: [SignalSample; PARAMETER_COUNT],
}

impl TickDraws {
    pub fn quiet(hour_of_day: f64) -> Self {
        Self {
            samples: [SignalSample::quiet(hour_of_day); PARAMETER_COUNT],
        }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R, hour_of_day: f64) -> Self {
        let mut samples = [SignalSample::quiet(hour_of_day); PARAMETER_COUNT];
        for (slot, parameter) in samples.iter_mut().zip(ParameterId::all()) {
            *slot = SignalSample::draw(&mut *rng, parameter.spec(), hour_of_day);
        }
        Self { samples }
    }
}

/// Everything a single tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub snapshot: TelemetrySnapshot,
    pub alerts: Vec<Alert>,
    pub scenario_events: Vec<ScenarioEvent>,
}

/// Evolving telemetry state owned by the orchestration loop.
#[derive(Debug, Clone)]
pub struct MonitorState {
    tick: u64,
    /// Generator output before scenario modifiers; the next tick blends from it.
    generated: SignalSet,
    /// Published values with active scenario modifiers applied.
    signals: SignalSet,
    statuses: IndexMap<ParameterId, Status>,
    trends: IndexMap<ParameterId, Trend>,
    trend_baseline: TrendBaseline,
    scenarios: ScenarioBoard,
    last_updated: Option<DateTime<Utc>>,
}

impl MonitorState {
    pub fn new(max_general_scenarios: usize) -> Self {
        Self::with_signals(SignalSet::baseline(), max_general_scenarios)
    }

    pub fn with_signals(signals: SignalSet, max_general_scenarios: usize) -> Self {
        Self {
            tick: 0,
            generated: signals,
            signals,
            statuses: ParameterId::all()
                .map(|parameter| (parameter, Status::Inactive))
                .collect(),
            trends: ParameterId::all()
                .map(|parameter| (parameter, Trend::flat()))
                .collect(),
            trend_baseline: TrendBaseline::default(),
            scenarios: ScenarioBoard::new(max_general_scenarios),
            last_updated: None,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }

    pub fn generated(&self) -> &SignalSet {
        &self.generated
    }

    pub fn status(&self, parameter: ParameterId) -> Status {
        self.statuses
            .get(&parameter)
            .copied()
            .unwrap_or(Status::Inactive)
    }

    pub fn scenarios(&self) -> &ScenarioBoard {
        &self.scenarios
    }

    pub fn scenarios_mut(&mut self) -> &mut ScenarioBoard {
        &mut self.scenarios
    }

    /// Run one tick: generators in dependency order, scenario modifiers,
    /// classification, trends, and transition alerts.
    ///
    /// Modifiers only shape the published values. Generators keep blending from
    /// their own unmodified output, so a scenario's offset never compounds.
    pub fn advance(&mut self, draws: &TickDraws, at: DateTime<Utc>) -> TickReport {
        self.generated = advance_all(&self.generated, &draws.samples);
        let mut signals = self.generated;
        let scenario_events = self.scenarios.advance(&mut signals);
        self.signals = signals;

        let mut alerts = Vec::new();
        for parameter in ParameterId::all() {
            let value = self.signals.get(parameter);
            let tier = classify(value, parameter);
            let previous = self.status(parameter).tier();
            if let Some(alert) = format_transition(parameter, previous, tier, value, at) {
                debug!(parameter = %parameter, value, tier = %tier, priority = %alert.priority, "status transition");
                alerts.push(alert);
            }
            self.statuses.insert(parameter, tier.into());

            let trend = match self.trend_baseline.snapshot() {
                Some(baseline) => Trend::between(value, baseline.get(parameter)),
                None => Trend::flat(),
            };
            self.trends.insert(parameter, trend);
        }
        if self.trend_baseline.snapshot().is_none() {
            self.trend_baseline.capture(&self.signals);
        }
        link_related(&mut alerts);

        self.tick += 1;
        self.last_updated = Some(at);
        trace!(tick = self.tick, "telemetry tick applied");
        TickReport {
            snapshot: self.snapshot(),
            alerts,
            scenario_events,
        }
    }

    /// Refresh the values trends are measured against.
    pub fn snapshot_trends(&mut self) {
        self.trend_baseline.capture(&self.signals);
    }

    /// Mark every reading inactive, as when the simulation is switched off.
    pub fn deactivate(&mut self) {
        for status in self.statuses.values_mut() {
            *status = Status::Inactive;
        }
        for trend in self.trends.values_mut() {
            *trend = Trend::flat();
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let readings = ParameterId::all()
            .map(|parameter| {
                let status = self.status(parameter);
                let reading = if status == Status::Inactive {
                    TelemetryReading {
                        value: self.signals.get(parameter),
                        display: parameter.spec().format_value(self.signals.get(parameter)),
                        ..TelemetryReading::inactive(parameter)
                    }
                } else {
                    let value = self.signals.get(parameter);
                    TelemetryReading {
                        parameter,
                        value,
                        display: parameter.spec().format_value(value),
                        status,
                        trend: self.trends.get(&parameter).copied().unwrap_or_default(),
                    }
                };
                (parameter, reading)
            })
            .collect();
        TelemetrySnapshot {
            tick: self.tick,
            timestamp: self.last_updated,
            readings,
            active_scenarios: self.scenarios.active().to_vec(),
        }
    }
}

/// RNG-driven wrapper around [`MonitorState`] with one entry point per cadence.
#[derive(Debug)]
pub struct SimulationEngine {
    state: MonitorState,
    rng: StdRng,
    scenarios_enabled: bool,
    scenario_probability: f64,
    synthetic: Option<SyntheticAlertSource>,
}

impl SimulationEngine {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &SimulationConfig, rng: StdRng) -> Self {
        Self {
            state: MonitorState::new(config.max_general_scenarios),
            rng,
            scenarios_enabled: config.scenarios_enabled,
            scenario_probability: config.scenario_probability,
            synthetic: config
                .synthetic_alerts_enabled
                .then(|| SyntheticAlertSource::new(config.synthetic_alert_probability)),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn tick(&mut self, at: DateTime<Utc>) -> TickReport {
        let draws = TickDraws::draw(&mut self.rng, hour_of_day(at));
        self.state.advance(&draws, at)
    }

    pub fn snapshot_trends(&mut self) {
        self.state.snapshot_trends();
    }

    pub fn roll_scenarios(&mut self) -> Vec<ScenarioEvent> {
        if !self.scenarios_enabled {
            return Vec::new();
        }
        self.state
            .scenarios
            .roll(&mut self.rng, self.scenario_probability)
    }

    pub fn inject_synthetic_alert(&mut self, at: DateTime<Utc>) -> Option<Alert> {
        let source = self.synthetic?;
        source.roll(&mut self.rng, at)
    }

    pub fn stop(&mut self) {
        self.state.deactivate();
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.state.snapshot()
    }
}

/// Drive an engine without timers, mapping wall-clock cadences onto tick counts.
#[derive(Debug)]
pub struct HeadlessRun {
    engine: SimulationEngine,
    tick_interval: Duration,
    trend_every: u64,
    scenario_every: u64,
    synthetic_every: u64,
    clock: DateTime<Utc>,
}

impl HeadlessRun {
    pub fn new(config: &SimulationConfig, start: DateTime<Utc>) -> Self {
        Self::with_engine(SimulationEngine::new(config), config, start)
    }

    pub fn with_engine(
        engine: SimulationEngine,
        config: &SimulationConfig,
        start: DateTime<Utc>,
    ) -> Self {
        let tick = config.tick_interval;
        Self {
            engine,
            tick_interval: tick,
            trend_every: ticks_per(config.trend_snapshot_interval, tick),
            scenario_every: ticks_per(config.scenario_roll_interval, tick),
            synthetic_every: ticks_per(config.synthetic_alert_interval, tick),
            clock: start,
        }
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Advance one tick and run whichever slower cadences fall due on it.
    pub fn step(&mut self) -> TickReport {
        let step = chrono::Duration::from_std(self.tick_interval)
            .unwrap_or_else(|_| chrono::Duration::seconds(1));
        self.clock += step;
        let index = self.engine.state().tick() + 1;

        let mut started = Vec::new();
        if index % self.scenario_every == 0 {
            started = self.engine.roll_scenarios();
        }
        let mut report = self.engine.tick(self.clock);
        if index % self.synthetic_every == 0 {
            if let Some(alert) = self.engine.inject_synthetic_alert(self.clock) {
                report.alerts.push(alert);
            }
        }
        if index % self.trend_every == 0 {
            self.engine.snapshot_trends();
        }
        if !started.is_empty() {
            started.append(&mut report.scenario_events);
            report.scenario_events = started;
        }
        report
    }
}

impl Iterator for HeadlessRun {
    type Item = TickReport;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step())
    }
}
