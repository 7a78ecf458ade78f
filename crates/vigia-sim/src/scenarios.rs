//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Declarative event scenarios that perturb generated telemetry."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
use std::f64::consts::PI;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::debug;

use crate::generators::SignalSet;
use crate::parameters::ParameterId;

const PROGRESS_EPSILON: f64 = 1e-9;

/// Map a configured chance onto `[0, 1]`; NaN and negatives never fire.
pub(crate) fn bounded_probability(probability: f64) -> f64 {
    if probability >= 0.0 {
        probability.min(1.0)
    } else {
        0.0
    }
}

/// Concurrency class of a scenario. Each class has its own slot budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScenarioClass {
    General,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScenarioKind {
    SealDeterioration,
    CorrosionSpike,
    PressureSurge,
    GasLeak,
    DeferredMaintenance,
}

/// Adjustment applied to a generator's output while a scenario is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Modifier {
    /// `value + amplitude * sin(progress * π)`: rises and subsides over the run.
    Sine { amplitude: f64 },
    /// `value + slope * progress`.
    Ramp { slope: f64 },
}

impl Modifier {
    pub fn apply(&self, value: f64, progress: f64) -> f64 {
        let progress = progress.clamp(0.0, 1.0);
        match *self {
            Modifier::Sine { amplitude } => value + amplitude * (progress * PI).sin(),
            Modifier::Ramp { slope } => value + slope * progress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDefinition {
    pub kind: ScenarioKind,
    pub class: ScenarioClass,
    pub title: &'static str,
    pub description: &'static str,
    /// Nominal length in ticks; progress advances by `1 / (duration / 2)` per tick.
    pub duration: u32,
    pub effects: &'static [(ParameterId, Modifier)],
}

impl ScenarioDefinition {
    pub fn progress_step(&self) -> f64 {
        let half = (f64::from(self.duration) / 2.0).max(1.0);
        1.0 / half
    }
}

impl ScenarioKind {
    pub fn all() -> impl Iterator<Item = ScenarioKind> {
        ScenarioKind::iter()
    }

    pub fn definition(self) -> &'static ScenarioDefinition {
        match self {
            ScenarioKind::SealDeterioration => &SEAL_DETERIORATION,
            ScenarioKind::CorrosionSpike => &CORROSION_SPIKE,
            ScenarioKind::PressureSurge => &PRESSURE_SURGE,
            ScenarioKind::GasLeak => &GAS_LEAK,
            ScenarioKind::DeferredMaintenance => &DEFERRED_MAINTENANCE,
        }
    }

    pub fn class(self) -> ScenarioClass {
        self.definition().class
    }
}

static SEAL_DETERIORATION: ScenarioDefinition = ScenarioDefinition {
    kind: ScenarioKind::SealDeterioration,
    class: ScenarioClass::General,
    title: "Seal deterioration",
    description: "Annular seal elastomer is degrading under cyclic load.",
    duration: 20,
    effects: &[
        (ParameterId::SealIntegrity, Modifier::Sine { amplitude: -12.0 }),
        (ParameterId::GasDetection, Modifier::Sine { amplitude: 6.0 }),
    ],
};

static CORROSION_SPIKE: ScenarioDefinition = ScenarioDefinition {
    kind: ScenarioKind::CorrosionSpike,
    class: ScenarioClass::General,
    title: "Corrosion spike",
    description: "Sour fluid slug is accelerating wall loss in the riser.",
    duration: 30,
    effects: &[(ParameterId::CorrosionRate, Modifier::Sine { amplitude: 0.7 })],
};

static PRESSURE_SURGE: ScenarioDefinition = ScenarioDefinition {
    kind: ScenarioKind::PressureSurge,
    class: ScenarioClass::General,
    title: "Pressure surge",
    description: "Formation kick is raising pressure across the BOP stack.",
    duration: 16,
    effects: &[
        (ParameterId::BopPressure, Modifier::Sine { amplitude: 380.0 }),
        (ParameterId::WellheadTemperature, Modifier::Sine { amplitude: 10.0 }),
    ],
};

static GAS_LEAK: ScenarioDefinition = ScenarioDefinition {
    kind: ScenarioKind::GasLeak,
    class: ScenarioClass::General,
    title: "Gas leak",
    description: "Hydrocarbon release detected near the wellhead module.",
    duration: 12,
    effects: &[(ParameterId::GasDetection, Modifier::Sine { amplitude: 28.0 })],
};

static DEFERRED_MAINTENANCE: ScenarioDefinition = ScenarioDefinition {
    kind: ScenarioKind::DeferredMaintenance,
    class: ScenarioClass::Maintenance,
    title: "Deferred maintenance",
    description: "Planned inspection window was postponed by operations.",
    duration: 24,
    effects: &[
        (ParameterId::MaintenanceDays, Modifier::Ramp { slope: -20.0 }),
        (ParameterId::SealIntegrity, Modifier::Ramp { slope: -3.0 }),
    ],
};

/// A running scenario instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveScenario {
    pub kind: ScenarioKind,
    pub progress: f64,
    pub ticks_elapsed: u32,
}

impl ActiveScenario {
    pub fn new(kind: ScenarioKind) -> Self {
        Self {
            kind,
            progress: 0.0,
            ticks_elapsed: 0,
        }
    }

    pub fn definition(&self) -> &'static ScenarioDefinition {
        self.kind.definition()
    }
}

/// Lifecycle notification emitted by the [`ScenarioBoard`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScenarioEvent {
    Started { kind: ScenarioKind },
    Resolved { kind: ScenarioKind },
}

impl ScenarioEvent {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioEvent::Started { kind } | ScenarioEvent::Resolved { kind } => *kind,
        }
    }

    pub fn message(&self) -> String {
        let definition = self.kind().definition();
        match self {
            ScenarioEvent::Started { .. } => {
                format!("{}: {}", definition.title, definition.description)
            }
            ScenarioEvent::Resolved { .. } => format!("{} resolved", definition.title),
        }
    }
}

/// Active scenario slots with per-class capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioBoard {
    max_general: usize,
    active: Vec<ActiveScenario>,
}

impl ScenarioBoard {
    pub const MAX_MAINTENANCE: usize = 1;

    pub fn new(max_general: usize) -> Self {
        Self {
            max_general: max_general.max(1),
            active: Vec::new(),
        }
    }

    pub fn active(&self) -> &[ActiveScenario] {
        &self.active
    }

    pub fn is_active(&self, kind: ScenarioKind) -> bool {
        self.active.iter().any(|scenario| scenario.kind == kind)
    }

    pub fn capacity(&self, class: ScenarioClass) -> usize {
        match class {
            ScenarioClass::General => self.max_general,
            ScenarioClass::Maintenance => Self::MAX_MAINTENANCE,
        }
    }

    pub fn active_in(&self, class: ScenarioClass) -> usize {
        self.active
            .iter()
            .filter(|scenario| scenario.kind.class() == class)
            .count()
    }

    /// Kinds of `class` that could start now.
    pub fn candidates(&self, class: ScenarioClass) -> Vec<ScenarioKind> {
        if self.active_in(class) >= self.capacity(class) {
            return Vec::new();
        }
        ScenarioKind::all()
            .filter(|kind| kind.class() == class && !self.is_active(*kind))
            .collect()
    }

    /// Start `kind` if its class has a free slot and it is not already running.
    pub fn start(&mut self, kind: ScenarioKind) -> Option<ScenarioEvent> {
        if self.is_active(kind) || self.active_in(kind.class()) >= self.capacity(kind.class()) {
            return None;
        }
        self.active.push(ActiveScenario::new(kind));
        debug!(scenario = %kind, class = %kind.class(), "scenario slot taken");
        Some(ScenarioEvent::Started { kind })
    }

    /// One start attempt per class, each succeeding with `probability`.
    pub fn roll<R: Rng + ?Sized>(&mut self, rng: &mut R, probability: f64) -> Vec<ScenarioEvent> {
        let probability = bounded_probability(probability);
        let mut events = Vec::new();
        for class in [ScenarioClass::General, ScenarioClass::Maintenance] {
            let candidates = self.candidates(class);
            if candidates.is_empty() || !rng.gen_bool(probability) {
                continue;
            }
            if let Some(kind) = candidates.choose(&mut *rng) {
                events.extend(self.start(*kind));
            }
        }
        events
    }

    /// Progress every active scenario by one tick and perturb `signals` in place.
    ///
    /// Modifiers run after the base generators and their output is re-clamped.
    /// Scenarios reaching full progress are removed and reported exactly once.
    pub fn advance(&mut self, signals: &mut SignalSet) -> Vec<ScenarioEvent> {
        let mut events = Vec::new();
        for scenario in &mut self.active {
            let definition = scenario.kind.definition();
            let progress = scenario.progress + definition.progress_step();
            // Absorb float drift so a duration of 2n always resolves after n ticks.
            scenario.progress = if progress >= 1.0 - PROGRESS_EPSILON {
                1.0
            } else {
                progress
            };
            scenario.ticks_elapsed += 1;
            for (parameter, modifier) in definition.effects {
                let spec = parameter.spec();
                let adjusted = modifier.apply(signals.get(*parameter), scenario.progress);
                signals.set(*parameter, spec.clamp(adjusted));
            }
            debug!(scenario = %scenario.kind, progress = scenario.progress, "scenario advanced");
        }
        self.active.retain(|scenario| {
            if scenario.progress >= 1.0 {
                debug!(scenario = %scenario.kind, ticks = scenario.ticks_elapsed, "scenario slot released");
                events.push(ScenarioEvent::Resolved {
                    kind: scenario.kind,
                });
                false
            } else {
                true
            }
        });
        events
    }
}
