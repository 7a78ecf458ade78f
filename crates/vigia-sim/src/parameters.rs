//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Static parameter table for the simulated rig sensors."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Physical quantities simulated for the rig, declared in generator dependency order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ParameterId {
    BopPressure,
    WellheadTemperature,
    GasDetection,
    SealIntegrity,
    CorrosionRate,
    MaintenanceDays,
}

impl ParameterId {
    /// All parameters in the order the generators must run within a tick.
    pub fn all() -> impl Iterator<Item = ParameterId> {
        ParameterId::iter()
    }

    pub fn spec(self) -> &'static ParameterSpec {
        match self {
            ParameterId::BopPressure => &BOP_PRESSURE,
            ParameterId::WellheadTemperature => &WELLHEAD_TEMPERATURE,
            ParameterId::GasDetection => &GAS_DETECTION,
            ParameterId::SealIntegrity => &SEAL_INTEGRITY,
            ParameterId::CorrosionRate => &CORROSION_RATE,
            ParameterId::MaintenanceDays => &MAINTENANCE_DAYS,
        }
    }
}

/// Whether a rising value moves the parameter towards or away from danger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    HigherIsWorse,
    HigherIsBetter,
}

/// Warning and alert boundaries. Ordering follows the owning parameter's polarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub warning: f64,
    pub alert: f64,
}

/// Rare discontinuous jump injected into a generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalySpec {
    pub probability: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub id: ParameterId,
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub baseline: f64,
    /// Fraction of the baseline used as the uniform noise amplitude.
    pub noise_level: f64,
    /// Inertia weight of the previous value in the blend.
    pub smoothing: f64,
    /// Amplitude of the 24-hour operational cycle.
    pub cyclic_amplitude: f64,
    pub polarity: Polarity,
    pub thresholds: ThresholdPair,
    pub anomaly: AnomalySpec,
    /// Digits after the decimal point in display strings.
    pub precision: usize,
}

impl ParameterSpec {
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.baseline;
        }
        value.clamp(self.min, self.max)
    }

    pub fn noise_amplitude(&self) -> f64 {
        self.baseline * self.noise_level
    }

    pub fn format_value(&self, value: f64) -> String {
        format_with_unit(value, self.precision, self.unit)
    }
}

pub(crate) fn format_with_unit(value: f64, precision: usize, unit: &str) -> String {
    if unit == "%" {
        format!("{:.*}%", precision, value)
    } else {
        format!("{:.*} {}", precision, value, unit)
    }
}

static BOP_PRESSURE: ParameterSpec = ParameterSpec {
    id: ParameterId::BopPressure,
    label: "BOP Pressure",
    unit: "psi",
    min: 1000.0,
    max: 2500.0,
    baseline: 1420.0,
    noise_level: 0.02,
    smoothing: 0.9,
    cyclic_amplitude: 15.0,
    polarity: Polarity::HigherIsWorse,
    thresholds: ThresholdPair {
        warning: 1700.0,
        alert: 1850.0,
    },
    anomaly: AnomalySpec {
        probability: 0.01,
        magnitude: 220.0,
    },
    precision: 0,
};

static WELLHEAD_TEMPERATURE: ParameterSpec = ParameterSpec {
    id: ParameterId::WellheadTemperature,
    label: "Wellhead Temperature",
    unit: "°C",
    min: 40.0,
    max: 150.0,
    baseline: 85.0,
    noise_level: 0.03,
    smoothing: 0.85,
    cyclic_amplitude: 4.0,
    polarity: Polarity::HigherIsWorse,
    thresholds: ThresholdPair {
        warning: 110.0,
        alert: 125.0,
    },
    anomaly: AnomalySpec {
        probability: 0.008,
        magnitude: 14.0,
    },
    precision: 1,
};

static GAS_DETECTION: ParameterSpec = ParameterSpec {
    id: ParameterId::GasDetection,
    label: "Gas Detection",
    unit: "ppm",
    min: 0.0,
    max: 100.0,
    baseline: 5.0,
    noise_level: 0.2,
    smoothing: 0.8,
    cyclic_amplitude: 0.5,
    polarity: Polarity::HigherIsWorse,
    thresholds: ThresholdPair {
        warning: 20.0,
        alert: 35.0,
    },
    anomaly: AnomalySpec {
        probability: 0.01,
        magnitude: 25.0,
    },
    precision: 1,
};

static SEAL_INTEGRITY: ParameterSpec = ParameterSpec {
    id: ParameterId::SealIntegrity,
    label: "Seal Integrity",
    unit: "%",
    min: 70.0,
    max: 100.0,
    baseline: 96.0,
    noise_level: 0.005,
    smoothing: 0.95,
    cyclic_amplitude: 0.3,
    polarity: Polarity::HigherIsBetter,
    thresholds: ThresholdPair {
        warning: 90.0,
        alert: 80.0,
    },
    anomaly: AnomalySpec {
        probability: 0.005,
        magnitude: -6.0,
    },
    precision: 1,
};

static CORROSION_RATE: ParameterSpec = ParameterSpec {
    id: ParameterId::CorrosionRate,
    label: "Corrosion Rate",
    unit: "mm/yr",
    min: 0.0,
    max: 2.0,
    baseline: 0.3,
    noise_level: 0.05,
    smoothing: 0.99,
    cyclic_amplitude: 0.02,
    polarity: Polarity::HigherIsWorse,
    thresholds: ThresholdPair {
        warning: 0.8,
        alert: 1.2,
    },
    anomaly: AnomalySpec {
        probability: 0.005,
        magnitude: 0.4,
    },
    precision: 2,
};

static MAINTENANCE_DAYS: ParameterSpec = ParameterSpec {
    id: ParameterId::MaintenanceDays,
    label: "Days to Maintenance",
    unit: "days",
    min: 0.0,
    max: 90.0,
    baseline: 45.0,
    noise_level: 0.01,
    smoothing: 0.98,
    cyclic_amplitude: 0.0,
    polarity: Polarity::HigherIsBetter,
    thresholds: ThresholdPair {
        warning: 14.0,
        alert: 7.0,
    },
    anomaly: AnomalySpec {
        probability: 0.005,
        magnitude: -5.0,
    },
    precision: 0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baselines_lie_within_bounds() {
        for id in ParameterId::all() {
            let spec = id.spec();
            assert_eq!(spec.id, id);
            assert!(spec.min <= spec.baseline && spec.baseline <= spec.max, "{id}");
            assert!((0.0..1.0).contains(&spec.smoothing), "{id}");
            assert!((0.005..=0.01).contains(&spec.anomaly.probability), "{id}");
        }
    }

    #[test]
    fn threshold_ordering_follows_polarity() {
        for id in ParameterId::all() {
            let spec = id.spec();
            match spec.polarity {
                Polarity::HigherIsWorse => {
                    assert!(spec.thresholds.warning < spec.thresholds.alert, "{id}")
                }
                Polarity::HigherIsBetter => {
                    assert!(spec.thresholds.warning > spec.thresholds.alert, "{id}")
                }
            }
        }
    }

    #[test]
    fn dependency_order_is_declaration_order() {
        let order: Vec<_> = ParameterId::all().collect();
        assert_eq!(
            order,
            vec![
                ParameterId::BopPressure,
                ParameterId::WellheadTemperature,
                ParameterId::GasDetection,
                ParameterId::SealIntegrity,
                ParameterId::CorrosionRate,
                ParameterId::MaintenanceDays,
            ]
        );
    }

    #[test]
    fn clamp_and_format() {
        let seal = ParameterId::SealIntegrity.spec();
        assert_eq!(seal.clamp(104.0), 100.0);
        assert_eq!(seal.clamp(f64::NAN), 96.0);
        assert_eq!(seal.format_value(84.04), "84.0%");
        assert_eq!(
            ParameterId::BopPressure.spec().format_value(1420.4),
            "1420 psi"
        );
        assert_eq!("gas-detection".parse::<ParameterId>().unwrap(), ParameterId::GasDetection);
    }
}
