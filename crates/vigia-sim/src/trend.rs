//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Short-term trend derivation against periodic snapshots."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::generators::SignalSet;

/// Changes smaller than this percentage are reported as flat.
pub const FLAT_BAND_PERCENT: f64 = 0.5;
/// Display ceiling for the trend magnitude.
pub const MAGNITUDE_CEILING: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Trend {
    /// Absolute percentage change, capped at [`MAGNITUDE_CEILING`].
    pub magnitude: f64,
    pub direction: Direction,
}

impl Trend {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn between(current: f64, previous: f64) -> Self {
        let percent = percent_change(current, previous);
        let direction = if percent.abs() < FLAT_BAND_PERCENT {
            Direction::Flat
        } else if percent > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };
        Self {
            magnitude: percent.abs().min(MAGNITUDE_CEILING),
            direction,
        }
    }

    pub fn label(&self) -> String {
        match self.direction {
            Direction::Flat => "stable".to_owned(),
            Direction::Up => format!("+{:.1}%", self.magnitude),
            Direction::Down => format!("-{:.1}%", self.magnitude),
        }
    }
}

/// Signed percentage change relative to `|previous|`, saturating at the ceiling.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    let delta = current - previous;
    if delta == 0.0 {
        return 0.0;
    }
    if previous == 0.0 {
        return MAGNITUDE_CEILING.copysign(delta);
    }
    (delta / previous.abs() * 100.0).clamp(-MAGNITUDE_CEILING, MAGNITUDE_CEILING)
}

/// Values captured on the slow cadence that trends are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrendBaseline {
    snapshot: Option<SignalSet>,
}

impl TrendBaseline {
    pub fn capture(&mut self, signals: &SignalSet) {
        self.snapshot = Some(*signals);
    }

    pub fn snapshot(&self) -> Option<&SignalSet> {
        self.snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_changes_are_flat() {
        let trend = Trend::between(1424.0, 1420.0);
        assert_eq!(trend.direction, Direction::Flat);
        assert_eq!(Trend::between(100.49, 100.0).direction, Direction::Flat);
        assert_eq!(Trend::between(99.51, 100.0).direction, Direction::Flat);
    }

    #[test]
    fn direction_follows_sign() {
        let up = Trend::between(110.0, 100.0);
        assert_eq!(up.direction, Direction::Up);
        assert!((up.magnitude - 10.0).abs() < 1e-9);
        let down = Trend::between(90.0, 100.0);
        assert_eq!(down.direction, Direction::Down);
        assert_eq!(down.label(), "-10.0%");
    }

    #[test]
    fn near_zero_denominator_is_capped() {
        let trend = Trend::between(5.0, 0.001);
        assert_eq!(trend.magnitude, MAGNITUDE_CEILING);
        assert_eq!(trend.direction, Direction::Up);
        let from_zero = Trend::between(-1.0, 0.0);
        assert_eq!(from_zero.magnitude, MAGNITUDE_CEILING);
        assert_eq!(from_zero.direction, Direction::Down);
        assert_eq!(Trend::between(0.0, 0.0), Trend::flat());
    }
}
