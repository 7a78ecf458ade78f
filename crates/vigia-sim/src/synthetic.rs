//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Coarse category alerts injected on a slow cadence."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use uuid::Uuid;

use crate::alerts::{Alert, Priority};
use crate::scenarios::bounded_probability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AlertCategory {
    GasLeak,
    PressureAnomaly,
    EquipmentFault,
    ComplianceDeadline,
    WeatherWarning,
}

struct CategoryTemplate {
    messages: &'static [&'static str],
    priorities: &'static [Priority],
    /// Range the reported value is drawn from, with its reference threshold.
    value_range: (f64, f64),
    threshold: f64,
}

impl AlertCategory {
    fn template(self) -> CategoryTemplate {
        match self {
            AlertCategory::GasLeak => CategoryTemplate {
                messages: &[
                    "H2S concentration rising in module C2",
                    "Methane detector triggered on the drill floor",
                ],
                priorities: &[Priority::High, Priority::Critical],
                value_range: (20.0, 60.0),
                threshold: 20.0,
            },
            AlertCategory::PressureAnomaly => CategoryTemplate {
                messages: &[
                    "Annulus pressure fluctuation outside operating envelope",
                    "Choke manifold pressure oscillation detected",
                ],
                priorities: &[Priority::Medium, Priority::High],
                value_range: (1700.0, 2100.0),
                threshold: 1700.0,
            },
            AlertCategory::EquipmentFault => CategoryTemplate {
                messages: &[
                    "Mud pump 2 vibration above limit",
                    "Hydraulic power unit accumulator pre-charge low",
                ],
                priorities: &[Priority::Low, Priority::Medium, Priority::High],
                value_range: (5.0, 12.0),
                threshold: 5.0,
            },
            AlertCategory::ComplianceDeadline => CategoryTemplate {
                messages: &[
                    "BOP function test due within 72 hours",
                    "Gas detector calibration certificate expiring",
                ],
                priorities: &[Priority::Low, Priority::Medium],
                value_range: (1.0, 3.0),
                threshold: 3.0,
            },
            AlertCategory::WeatherWarning => CategoryTemplate {
                messages: &[
                    "Significant wave height forecast above crane limit",
                    "Wind gusts above 45 knots expected within 6 hours",
                ],
                priorities: &[Priority::Medium, Priority::High],
                value_range: (40.0, 60.0),
                threshold: 45.0,
            },
        }
    }
}

/// Source of coarse, category-based alerts independent of the signal generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticAlertSource {
    probability: f64,
}

impl SyntheticAlertSource {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: bounded_probability(probability),
        }
    }

    /// Roll once; on success returns an alert of a uniformly chosen category.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, at: DateTime<Utc>) -> Option<Alert> {
        if !rng.gen_bool(self.probability) {
            return None;
        }
        let categories: Vec<AlertCategory> = AlertCategory::iter().collect();
        let category = *categories.choose(&mut *rng)?;
        Some(Self::generate(rng, category, at))
    }

    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        category: AlertCategory,
        at: DateTime<Utc>,
    ) -> Alert {
        let template = category.template();
        let message = template
            .messages
            .choose(&mut *rng)
            .copied()
            .unwrap_or("Unclassified operational alert");
        let priority = template
            .priorities
            .choose(&mut *rng)
            .copied()
            .unwrap_or(Priority::Low);
        let (low, high) = template.value_range;
        Alert {
            id: Uuid::new_v4(),
            source: category.to_string(),
            parameter: None,
            timestamp: at,
            message: message.to_owned(),
            value: rng.gen_range(low..=high),
            threshold: template.threshold,
            priority,
            acknowledged: false,
            related: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn certain_roll_always_yields_alert() {
        let mut rng = StdRng::seed_from_u64(3);
        let source = SyntheticAlertSource::new(1.0);
        for _ in 0..50 {
            let alert = source.roll(&mut rng, Utc::now()).unwrap();
            assert!(alert.parameter.is_none());
            assert!(!alert.acknowledged);
            assert!(AlertCategory::iter().any(|category| category.to_string() == alert.source));
        }
    }

    #[test]
    fn disabled_source_is_silent() {
        let mut rng = StdRng::seed_from_u64(3);
        let source = SyntheticAlertSource::new(0.0);
        assert!((0..100).all(|_| source.roll(&mut rng, Utc::now()).is_none()));
    }

    #[test]
    fn non_finite_probability_never_fires() {
        let mut rng = StdRng::seed_from_u64(3);
        for probability in [f64::NAN, f64::NEG_INFINITY, -0.5] {
            let source = SyntheticAlertSource::new(probability);
            assert!((0..50).all(|_| source.roll(&mut rng, Utc::now()).is_none()));
        }
        let saturated = SyntheticAlertSource::new(f64::INFINITY);
        assert!(saturated.roll(&mut rng, Utc::now()).is_some());
    }

    #[test]
    fn generated_values_use_category_template() {
        let mut rng = StdRng::seed_from_u64(9);
        let alert = SyntheticAlertSource::generate(&mut rng, AlertCategory::GasLeak, Utc::now());
        assert_eq!(alert.source, "gas-leak");
        assert!(alert.value >= 20.0 && alert.value <= 60.0);
        assert!(matches!(alert.priority, Priority::High | Priority::Critical));
    }
}
