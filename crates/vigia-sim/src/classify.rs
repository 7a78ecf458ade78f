//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Static threshold classification of telemetry values."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
//! Classification is recomputed from the raw value on every tick. There is no
//! hysteresis band, so a value oscillating around a threshold flips tiers on
//! consecutive ticks.
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::parameters::{ParameterId, Polarity};

/// Health tier of a classified value, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Normal,
    Warning,
    Alert,
}

/// Reading status exposed to consumers; `Inactive` until the first tick lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Alert,
    #[default]
    Inactive,
}

impl From<Tier> for Status {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Normal => Status::Normal,
            Tier::Warning => Status::Warning,
            Tier::Alert => Status::Alert,
        }
    }
}

impl Status {
    pub fn tier(self) -> Option<Tier> {
        match self {
            Status::Normal => Some(Tier::Normal),
            Status::Warning => Some(Tier::Warning),
            Status::Alert => Some(Tier::Alert),
            Status::Inactive => None,
        }
    }
}

pub fn classify(value: f64, parameter: ParameterId) -> Tier {
    let spec = parameter.spec();
    let thresholds = spec.thresholds;
    match spec.polarity {
        Polarity::HigherIsWorse => {
            if value >= thresholds.alert {
                Tier::Alert
            } else if value >= thresholds.warning {
                Tier::Warning
            } else {
                Tier::Normal
            }
        }
        Polarity::HigherIsBetter => {
            if value <= thresholds.alert {
                Tier::Alert
            } else if value <= thresholds.warning {
                Tier::Warning
            } else {
                Tier::Normal
            }
        }
    }
}

/// Threshold crossed to reach `tier`, if any.
pub fn threshold_for(parameter: ParameterId, tier: Tier) -> Option<f64> {
    let thresholds = parameter.spec().thresholds;
    match tier {
        Tier::Normal => None,
        Tier::Warning => Some(thresholds.warning),
        Tier::Alert => Some(thresholds.alert),
    }
}
