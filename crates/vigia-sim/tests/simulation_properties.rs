//! ---
//! vigia_section: "15-testing-qa-runbook"
//! vigia_subsection: "integration-tests"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Long-running properties of the telemetry simulation."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use vigia_common::config::SimulationConfig;
use vigia_sim::{HeadlessRun, ParameterId, ScenarioClass, ScenarioEvent, ScenarioKind, Status};

fn aggressive_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        tick_interval: Duration::from_secs(1),
        trend_snapshot_interval: Duration::from_secs(10),
        scenario_roll_interval: Duration::from_secs(2),
        synthetic_alert_interval: Duration::from_secs(5),
        scenario_probability: 1.0,
        synthetic_alert_probability: 0.5,
        max_general_scenarios: 2,
        random_seed: Some(seed),
        ..SimulationConfig::default()
    }
}

#[test]
fn values_stay_within_bounds_under_scenarios() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    for seed in [1, 2, 3] {
        for report in HeadlessRun::new(&aggressive_config(seed), start).take(3_000) {
            for reading in report.snapshot.readings.values() {
                let spec = reading.parameter.spec();
                assert!(
                    reading.value >= spec.min && reading.value <= spec.max,
                    "{} out of bounds: {}",
                    reading.parameter,
                    reading.value
                );
                assert_ne!(reading.status, Status::Inactive);
                assert!(reading.trend.magnitude <= 99.0);
            }
        }
    }
}

#[test]
fn every_started_scenario_resolves_exactly_once() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let mut open: HashMap<ScenarioKind, u32> = HashMap::new();
    let mut resolved_total = 0;
    let mut run = HeadlessRun::new(&aggressive_config(17), start);
    for _ in 0..2_000 {
        let report = run.step();
        for event in &report.scenario_events {
            match event {
                ScenarioEvent::Started { kind } => {
                    let count = open.entry(*kind).or_default();
                    assert_eq!(*count, 0, "{kind} started while active");
                    *count += 1;
                }
                ScenarioEvent::Resolved { kind } => {
                    let count = open.entry(*kind).or_default();
                    assert_eq!(*count, 1, "{kind} resolved without being active");
                    *count -= 1;
                    resolved_total += 1;
                }
            }
        }
        let board = run.engine().state().scenarios();
        assert!(board.active_in(ScenarioClass::General) <= 2);
        assert!(board.active_in(ScenarioClass::Maintenance) <= 1);
    }
    assert!(resolved_total > 0);
}

#[test]
fn alerts_reference_their_parameter_and_threshold() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap();
    let mut seen = 0;
    for report in HeadlessRun::new(&aggressive_config(23), start).take(2_000) {
        for alert in report.alerts.iter().filter(|alert| alert.parameter.is_some()) {
            let parameter: ParameterId = alert.parameter.unwrap();
            let thresholds = parameter.spec().thresholds;
            assert!(alert.threshold == thresholds.warning || alert.threshold == thresholds.alert);
            assert!(alert.message.starts_with(parameter.spec().label));
            seen += 1;
        }
    }
    assert!(seen > 0, "scenarios should push at least one parameter past a threshold");
}
