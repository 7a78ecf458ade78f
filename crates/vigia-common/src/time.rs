//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Shared primitives and utilities for the monitoring runtime."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

/// Fractional hour of the day in `[0, 24)`, used by the cyclic signal terms.
pub fn hour_of_day(at: DateTime<Utc>) -> f64 {
    f64::from(at.hour()) + f64::from(at.minute()) / 60.0 + f64::from(at.second()) / 3_600.0
}

/// Number of base ticks that fit into a slower cadence, never less than one.
pub fn ticks_per(cadence: Duration, tick: Duration) -> u64 {
    if tick.is_zero() {
        return 1;
    }
    (cadence.as_nanos() / tick.as_nanos()).max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn hour_of_day_is_fractional() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        assert!((hour_of_day(at) - 18.5).abs() < 1e-9);
    }

    #[test]
    fn ticks_per_rounds_down_and_saturates_at_one() {
        assert_eq!(ticks_per(Duration::from_secs(10), Duration::from_secs(1)), 10);
        assert_eq!(ticks_per(Duration::from_millis(500), Duration::from_secs(1)), 1);
        assert_eq!(ticks_per(Duration::from_secs(1), Duration::ZERO), 1);
    }
}
