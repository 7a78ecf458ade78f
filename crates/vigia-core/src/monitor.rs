//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Primary orchestration and lifecycle management."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;
use vigia_common::config::SimulationConfig;
use vigia_common::metrics::LoopTimingReporter;
use vigia_metrics::MonitorMetrics;
use vigia_sim::{Alert, Priority, ScenarioEvent, ScenarioKind, SimulationEngine, TelemetrySnapshot};

use crate::integration_persistence::AlertFeedBridge;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Everything the monitoring loop publishes to subscribers.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Telemetry(Arc<TelemetrySnapshot>),
    Alert(Alert),
    ScenarioStarted(ScenarioKind),
    ScenarioResolved(ScenarioKind),
}

/// Configured but not yet running monitor.
#[derive(Debug)]
pub struct MonitorRuntime {
    config: SimulationConfig,
    engine: SimulationEngine,
    feed: Option<Arc<AlertFeedBridge>>,
    metrics: Option<MonitorMetrics>,
    events: broadcast::Sender<MonitorEvent>,
}

impl MonitorRuntime {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config
            .validate()
            .context("invalid simulation configuration")?;
        let engine = SimulationEngine::new(&config);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            engine,
            feed: None,
            metrics: None,
            events,
        })
    }

    /// Replace the engine, e.g. with one built around a fixed RNG.
    pub fn with_engine(mut self, engine: SimulationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_feed(mut self, feed: AlertFeedBridge) -> Self {
        self.feed = Some(Arc::new(feed));
        self
    }

    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Receiver registered before the first tick, so no event is missed.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Spawn the timer loop onto the current tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        if let Some(feed) = &self.feed {
            feed.recover();
        }
        let engine = Arc::new(Mutex::new(self.engine));
        let context = LoopContext {
            engine: engine.clone(),
            feed: self.feed.clone(),
            metrics: self.metrics,
            events: self.events.clone(),
            reporter: LoopTimingReporter::new(self.config.tick_interval),
        };
        let config = self.config;
        info!(
            tick_ms = config.tick_interval.as_millis() as u64,
            scenarios = config.scenarios_enabled,
            synthetic_alerts = config.synthetic_alerts_enabled,
            seeded = config.random_seed.is_some(),
            "monitor started"
        );
        let task = tokio::spawn(run_loop(context, config, shutdown_rx));
        MonitorHandle {
            engine,
            events: self.events,
            feed: self.feed,
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Control surface for a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    engine: Arc<Mutex<SimulationEngine>>,
    events: broadcast::Sender<MonitorEvent>,
    feed: Option<Arc<AlertFeedBridge>>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Latest readings; the loop is the only writer.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.engine.lock().snapshot()
    }

    /// Persisted alerts, newest first. Empty when no feed is attached.
    pub fn recent_alerts(&self) -> Result<Vec<Alert>> {
        match &self.feed {
            Some(feed) => feed.recent(),
            None => Ok(Vec::new()),
        }
    }

    pub fn acknowledge(&self, id: Uuid) -> Result<Option<Alert>> {
        match &self.feed {
            Some(feed) => feed.acknowledge(id),
            None => Ok(None),
        }
    }

    /// Stop all timers and return the final, inactive snapshot.
    pub async fn shutdown(self) -> Result<TelemetrySnapshot> {
        let _ = self.shutdown.send(());
        self.task.await.context("monitor task join error")?;
        let snapshot = self.engine.lock().snapshot();
        info!(tick = snapshot.tick, "monitor shutdown complete");
        Ok(snapshot)
    }
}

struct LoopContext {
    engine: Arc<Mutex<SimulationEngine>>,
    feed: Option<Arc<AlertFeedBridge>>,
    metrics: Option<MonitorMetrics>,
    events: broadcast::Sender<MonitorEvent>,
    reporter: LoopTimingReporter,
}

fn delayed_interval(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run_loop(
    context: LoopContext,
    config: SimulationConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticks = time::interval(config.tick_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut trends = delayed_interval(config.trend_snapshot_interval);
    let mut rolls = delayed_interval(config.scenario_roll_interval);
    let mut synthetic = delayed_interval(config.synthetic_alert_interval);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("monitor shutdown signal received");
                break;
            }
            _ = ticks.tick() => context.on_tick(),
            _ = trends.tick() => context.engine.lock().snapshot_trends(),
            _ = rolls.tick() => context.on_scenario_roll(),
            _ = synthetic.tick() => context.on_synthetic_alert(),
        }
    }

    context.finish();
}

impl LoopContext {
    fn on_tick(&self) {
        self.reporter.record_tick();
        let started = std::time::Instant::now();
        let report = self.engine.lock().tick(Utc::now());
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_tick(elapsed.as_secs_f64());
            for reading in report.snapshot.readings.values() {
                metrics.set_parameter(&reading.parameter.to_string(), reading.value);
            }
            metrics.set_scenarios_active(report.snapshot.active_scenarios.len());
        }

        let _ = self
            .events
            .send(MonitorEvent::Telemetry(Arc::new(report.snapshot)));
        self.publish_scenarios(report.scenario_events);
        self.publish_alerts(report.alerts);
    }

    fn on_scenario_roll(&self) {
        let (events, active) = {
            let mut engine = self.engine.lock();
            let events = engine.roll_scenarios();
            (events, engine.state().scenarios().active().len())
        };
        if let Some(metrics) = &self.metrics {
            metrics.set_scenarios_active(active);
        }
        self.publish_scenarios(events);
    }

    fn on_synthetic_alert(&self) {
        let alert = self.engine.lock().inject_synthetic_alert(Utc::now());
        if let Some(alert) = alert {
            self.publish_alerts(vec![alert]);
        }
    }

    fn publish_scenarios(&self, events: Vec<ScenarioEvent>) {
        for event in events {
            let kind = event.kind();
            match event {
                ScenarioEvent::Started { .. } => {
                    info!(scenario = %kind, message = %event.message(), "scenario started");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_scenario_started(&kind.to_string());
                    }
                    let _ = self.events.send(MonitorEvent::ScenarioStarted(kind));
                }
                ScenarioEvent::Resolved { .. } => {
                    info!(scenario = %kind, "scenario resolved");
                    let _ = self.events.send(MonitorEvent::ScenarioResolved(kind));
                }
            }
        }
    }

    fn publish_alerts(&self, alerts: Vec<Alert>) {
        if alerts.is_empty() {
            return;
        }
        for alert in &alerts {
            match alert.priority {
                Priority::High | Priority::Critical => warn!(
                    alert_id = %alert.id,
                    source = %alert.source,
                    priority = %alert.priority,
                    value = alert.value,
                    threshold = alert.threshold,
                    "{}",
                    alert.message
                ),
                Priority::Low | Priority::Medium => info!(
                    alert_id = %alert.id,
                    source = %alert.source,
                    priority = %alert.priority,
                    value = alert.value,
                    threshold = alert.threshold,
                    "{}",
                    alert.message
                ),
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_alert(&alert.priority.to_string());
            }
        }
        // Persist before notifying so subscribers can read the feed back.
        if let Some(feed) = &self.feed {
            feed.record(&alerts);
        }
        for alert in alerts {
            let _ = self.events.send(MonitorEvent::Alert(alert));
        }
    }

    fn finish(self) {
        let snapshot = {
            let mut engine = self.engine.lock();
            engine.stop();
            engine.snapshot()
        };
        if let Some(metrics) = &self.metrics {
            metrics.set_scenarios_active(0);
        }
        let _ = self.events.send(MonitorEvent::Telemetry(Arc::new(snapshot)));
        match self.reporter.histogram().summary() {
            Some(summary) => info!(
                samples = summary.samples,
                mean_ms = summary.mean_ms,
                p95_ms = summary.p95_ms,
                max_ms = summary.max_ms,
                "monitor loop timing"
            ),
            None => debug!("monitor stopped before a second tick"),
        }
    }
}
