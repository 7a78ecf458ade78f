//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Alert records and status-transition formatting."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::classify::{threshold_for, Tier};
use crate::parameters::{format_with_unit, ParameterId, Polarity};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Severity bands on the percentage distance past the crossed threshold.
    pub fn from_deviation(deviation_percent: f64) -> Self {
        let deviation = deviation_percent.abs();
        if deviation > 10.0 {
            Priority::Critical
        } else if deviation > 5.0 {
            Priority::High
        } else if deviation > 2.0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Warning-tier alerts never escalate past `High`.
    pub fn for_tier(tier: Tier, deviation_percent: f64) -> Self {
        let priority = Self::from_deviation(deviation_percent);
        match tier {
            Tier::Warning => priority.min(Priority::High),
            _ => priority,
        }
    }
}

/// User-facing notice derived from telemetry or injected by the synthetic source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub source: String,
    #[serde(default)]
    pub parameter: Option<ParameterId>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub priority: Priority,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Uuid>,
}

impl Alert {
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }
}

/// Percentage distance of `value` past `threshold` in the parameter's bad direction.
pub fn deviation_percent(parameter: ParameterId, value: f64, threshold: f64) -> f64 {
    if threshold == 0.0 {
        return 0.0;
    }
    let past = match parameter.spec().polarity {
        Polarity::HigherIsWorse => value - threshold,
        Polarity::HigherIsBetter => threshold - value,
    };
    (past / threshold.abs() * 100.0).max(0.0)
}

/// Build the alert for a tier transition, or `None` when no notice is due.
///
/// Only transitions into `Warning` or `Alert` produce a notice; recoveries and
/// repeated tiers are silent.
pub fn format_transition(
    parameter: ParameterId,
    previous: Option<Tier>,
    current: Tier,
    value: f64,
    at: DateTime<Utc>,
) -> Option<Alert> {
    if previous == Some(current) || current == Tier::Normal {
        return None;
    }
    let threshold = threshold_for(parameter, current)?;
    let spec = parameter.spec();
    let deviation = deviation_percent(parameter, value, threshold);
    let tier_label = match current {
        Tier::Alert => "alert",
        _ => "warning",
    };
    let verb = match spec.polarity {
        Polarity::HigherIsWorse => "exceeds",
        Polarity::HigherIsBetter => "has fallen below",
    };
    let message = format!(
        "{} at {} {} {} threshold of {}",
        spec.label,
        spec.format_value(value),
        verb,
        tier_label,
        format_with_unit(threshold, spec.precision, spec.unit),
    );
    Some(Alert {
        id: Uuid::new_v4(),
        source: parameter.to_string(),
        parameter: Some(parameter),
        timestamp: at,
        message,
        value,
        threshold,
        priority: Priority::for_tier(current, deviation),
        acknowledged: false,
        related: Vec::new(),
    })
}

/// Cross-reference alerts raised together so consumers can group them.
pub fn link_related(alerts: &mut [Alert]) {
    if alerts.len() < 2 {
        return;
    }
    let ids: Vec<Uuid> = alerts.iter().map(|alert| alert.id).collect();
    for alert in alerts.iter_mut() {
        alert.related = ids.iter().copied().filter(|id| *id != alert.id).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bands() {
        assert_eq!(Priority::from_deviation(12.0), Priority::Critical);
        assert_eq!(Priority::from_deviation(6.0), Priority::High);
        assert_eq!(Priority::from_deviation(3.0), Priority::Medium);
        assert_eq!(Priority::from_deviation(1.9), Priority::Low);
        assert_eq!(Priority::from_deviation(10.0), Priority::High);
    }

    #[test]
    fn twelve_percent_past_alert_threshold_is_critical() {
        let deviation = deviation_percent(ParameterId::BopPressure, 2072.0, 1850.0);
        assert!((deviation - 12.0).abs() < 1e-9);
        let alert = format_transition(
            ParameterId::BopPressure,
            Some(Tier::Warning),
            Tier::Alert,
            2072.0,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(alert.priority, Priority::Critical);
        assert_eq!(alert.threshold, 1850.0);
        assert_eq!(
            alert.message,
            "BOP Pressure at 2072 psi exceeds alert threshold of 1850 psi"
        );
    }

    #[test]
    fn bands_apply_past_threshold_for_each_tier() {
        let at = Utc::now();
        let high = format_transition(ParameterId::BopPressure, None, Tier::Alert, 1961.0, at);
        assert_eq!(high.unwrap().priority, Priority::High);
        let medium = format_transition(ParameterId::BopPressure, None, Tier::Alert, 1905.5, at);
        assert_eq!(medium.unwrap().priority, Priority::Medium);
        let low = format_transition(ParameterId::BopPressure, None, Tier::Alert, 1870.0, at);
        assert_eq!(low.unwrap().priority, Priority::Low);
    }

    #[test]
    fn warning_tier_caps_at_high() {
        assert_eq!(Priority::for_tier(Tier::Warning, 40.0), Priority::High);
        assert_eq!(Priority::for_tier(Tier::Alert, 40.0), Priority::Critical);
    }

    #[test]
    fn lower_is_worse_message_and_deviation() {
        let alert = format_transition(
            ParameterId::SealIntegrity,
            Some(Tier::Warning),
            Tier::Alert,
            78.5,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            alert.message,
            "Seal Integrity at 78.5% has fallen below alert threshold of 80.0%"
        );
        // 1.5 / 80 = 1.875 %
        assert_eq!(alert.priority, Priority::Low);
    }

    #[test]
    fn only_escalating_transitions_notify() {
        let at = Utc::now();
        assert!(format_transition(ParameterId::GasDetection, Some(Tier::Alert), Tier::Alert, 40.0, at).is_none());
        assert!(format_transition(ParameterId::GasDetection, Some(Tier::Warning), Tier::Normal, 4.0, at).is_none());
        let downgrade =
            format_transition(ParameterId::GasDetection, Some(Tier::Alert), Tier::Warning, 22.0, at);
        assert!(downgrade.is_some());
    }

    #[test]
    fn related_links_exclude_self() {
        let at = Utc::now();
        let mut alerts: Vec<Alert> = [ParameterId::BopPressure, ParameterId::GasDetection]
            .into_iter()
            .zip([1900.0, 40.0])
            .filter_map(|(id, value)| format_transition(id, None, Tier::Alert, value, at))
            .collect();
        link_related(&mut alerts);
        assert_eq!(alerts[0].related, vec![alerts[1].id]);
        assert_eq!(alerts[1].related, vec![alerts[0].id]);
    }

    #[test]
    fn serialises_timestamp_as_rfc3339() {
        let alert = format_transition(
            ParameterId::CorrosionRate,
            None,
            Tier::Warning,
            0.85,
            "2024-03-01T12:00:00Z".parse().unwrap(),
        )
        .unwrap();
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00Z");
        assert_eq!(json["parameter"], "corrosion-rate");
        assert_eq!(json["priority"], "high");
        let back: Alert = serde_json::from_value(json).unwrap();
        assert_eq!(back, alert);
    }
}
