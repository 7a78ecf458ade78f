//! ---
//! vigia_section: "11-simulation"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Per-parameter signal generators with correlated drift."
//! vigia_version: "v0.1.0"
//! vigia_owner: "tbd"
//! ---
//! Each generator blends the previous value towards a moving target:
//!
//! ```text
//! target = baseline + correlation + cyclic + noise + anomaly
//! next   = clamp(previous * α + target * (1 - α))
//! ```
//!
//! Generators later in [`ParameterId::all`] read the values produced earlier in
//! the same tick, never the previous tick's.
use std::f64::consts::PI;

use rand::Rng;

use crate::parameters::{ParameterId, ParameterSpec};

/// Random inputs consumed by a single generator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSample {
    pub hour_of_day: f64,
    /// Uniform draw in `[-1, 1]`, scaled by the parameter's noise amplitude.
    pub noise: f64,
    pub anomaly: bool,
}

impl SignalSample {
    /// Sample without noise or anomaly, leaving only the deterministic terms.
    pub fn quiet(hour_of_day: f64) -> Self {
        Self {
            hour_of_day,
            noise: 0.0,
            anomaly: false,
        }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R, spec: &ParameterSpec, hour_of_day: f64) -> Self {
        Self {
            hour_of_day,
            noise: rng.gen_range(-1.0..=1.0),
            anomaly: rng.gen_bool(spec.anomaly.probability),
        }
    }
}

/// Values produced so far within the current tick, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSet {
    pub bop_pressure: f64,
    pub wellhead_temperature: f64,
    pub gas_detection: f64,
    pub seal_integrity: f64,
    pub corrosion_rate: f64,
    pub maintenance_days: f64,
}

impl SignalSet {
    pub fn baseline() -> Self {
        Self {
            bop_pressure: ParameterId::BopPressure.spec().baseline,
            wellhead_temperature: ParameterId::WellheadTemperature.spec().baseline,
            gas_detection: ParameterId::GasDetection.spec().baseline,
            seal_integrity: ParameterId::SealIntegrity.spec().baseline,
            corrosion_rate: ParameterId::CorrosionRate.spec().baseline,
            maintenance_days: ParameterId::MaintenanceDays.spec().baseline,
        }
    }

    pub fn get(&self, id: ParameterId) -> f64 {
        match id {
            ParameterId::BopPressure => self.bop_pressure,
            ParameterId::WellheadTemperature => self.wellhead_temperature,
            ParameterId::GasDetection => self.gas_detection,
            ParameterId::SealIntegrity => self.seal_integrity,
            ParameterId::CorrosionRate => self.corrosion_rate,
            ParameterId::MaintenanceDays => self.maintenance_days,
        }
    }

    pub fn set(&mut self, id: ParameterId, value: f64) {
        let slot = match id {
            ParameterId::BopPressure => &mut self.bop_pressure,
            ParameterId::WellheadTemperature => &mut self.wellhead_temperature,
            ParameterId::GasDetection => &mut self.gas_detection,
            ParameterId::SealIntegrity => &mut self.seal_integrity,
            ParameterId::CorrosionRate => &mut self.corrosion_rate,
            ParameterId::MaintenanceDays => &mut self.maintenance_days,
        };
        *slot = value;
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Sinusoidal 24-hour operational cycle.
pub fn cyclic_effect(spec: &ParameterSpec, hour_of_day: f64) -> f64 {
    spec.cyclic_amplitude * (2.0 * PI * hour_of_day / 24.0).sin()
}

fn deviation(id: ParameterId, value: f64) -> f64 {
    value - id.spec().baseline
}

fn blend(spec: &ParameterSpec, previous: f64, correlation: f64, sample: &SignalSample) -> f64 {
    let noise = sample.noise.clamp(-1.0, 1.0) * spec.noise_amplitude();
    let anomaly = if sample.anomaly {
        spec.anomaly.magnitude
    } else {
        0.0
    };
    let target =
        spec.baseline + correlation + cyclic_effect(spec, sample.hour_of_day) + noise + anomaly;
    let previous = spec.clamp(previous);
    spec.clamp(previous * spec.smoothing + target * (1.0 - spec.smoothing))
}

pub fn next_bop_pressure(previous: f64, sample: &SignalSample) -> f64 {
    blend(ParameterId::BopPressure.spec(), previous, 0.0, sample)
}

pub fn next_wellhead_temperature(previous: f64, bop_pressure: f64, sample: &SignalSample) -> f64 {
    let correlation = 0.02 * deviation(ParameterId::BopPressure, bop_pressure);
    blend(
        ParameterId::WellheadTemperature.spec(),
        previous,
        correlation,
        sample,
    )
}

pub fn next_gas_detection(previous: f64, wellhead_temperature: f64, sample: &SignalSample) -> f64 {
    let correlation = 0.3 * deviation(ParameterId::WellheadTemperature, wellhead_temperature);
    blend(ParameterId::GasDetection.spec(), previous, correlation, sample)
}

pub fn next_seal_integrity(
    previous: f64,
    bop_pressure: f64,
    wellhead_temperature: f64,
    sample: &SignalSample,
) -> f64 {
    // Heat below baseline does not restore the seal.
    let correlation = -0.004 * deviation(ParameterId::BopPressure, bop_pressure)
        - 0.05
            * deviation(ParameterId::WellheadTemperature, wellhead_temperature).max(0.0);
    blend(ParameterId::SealIntegrity.spec(), previous, correlation, sample)
}

pub fn next_corrosion_rate(
    previous: f64,
    wellhead_temperature: f64,
    gas_detection: f64,
    sample: &SignalSample,
) -> f64 {
    let correlation = 0.004 * deviation(ParameterId::WellheadTemperature, wellhead_temperature)
        + 0.01 * deviation(ParameterId::GasDetection, gas_detection);
    blend(ParameterId::CorrosionRate.spec(), previous, correlation, sample)
}

pub fn next_maintenance_days(
    previous: f64,
    corrosion_rate: f64,
    seal_integrity: f64,
    sample: &SignalSample,
) -> f64 {
    let correlation = -20.0 * deviation(ParameterId::CorrosionRate, corrosion_rate)
        + 0.5 * deviation(ParameterId::SealIntegrity, seal_integrity);
    blend(
        ParameterId::MaintenanceDays.spec(),
        previous,
        correlation,
        sample,
    )
}

/// Advance every generator once, in dependency order.
///
/// `samples` is indexed like [`ParameterId::all`].
pub fn advance_all(previous: &SignalSet, samples: &[SignalSample; 6]) -> SignalSet {
    let bop_pressure = next_bop_pressure(previous.bop_pressure, &samples[0]);
    let wellhead_temperature =
        next_wellhead_temperature(previous.wellhead_temperature, bop_pressure, &samples[1]);
    let gas_detection =
        next_gas_detection(previous.gas_detection, wellhead_temperature, &samples[2]);
    let seal_integrity = next_seal_integrity(
        previous.seal_integrity,
        bop_pressure,
        wellhead_temperature,
        &samples[3],
    );
    let corrosion_rate = next_corrosion_rate(
        previous.corrosion_rate,
        wellhead_temperature,
        gas_detection,
        &samples[4],
    );
    let maintenance_days = next_maintenance_days(
        previous.maintenance_days,
        corrosion_rate,
        seal_integrity,
        &samples[5],
    );
    SignalSet {
        bop_pressure,
        wellhead_temperature,
        gas_detection,
        seal_integrity,
        corrosion_rate,
        maintenance_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MIDNIGHT: f64 = 0.0;

    #[test]
    fn pressure_regresses_towards_baseline() {
        let next = next_bop_pressure(1600.0, &SignalSample::quiet(MIDNIGHT));
        assert!((next - (1600.0 * 0.9 + 1420.0 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn cyclic_term_peaks_at_six() {
        let spec = ParameterId::BopPressure.spec();
        assert!((cyclic_effect(spec, 6.0) - 15.0).abs() < 1e-9);
        let next = next_bop_pressure(1420.0, &SignalSample::quiet(6.0));
        assert!((next - (1420.0 + 1.5)).abs() < 1e-9);
    }

    #[test]
    fn temperature_follows_current_pressure() {
        let sample = SignalSample::quiet(MIDNIGHT);
        let calm = next_wellhead_temperature(85.0, 1420.0, &sample);
        let hot = next_wellhead_temperature(85.0, 1920.0, &sample);
        assert!((calm - 85.0).abs() < 1e-9);
        // 0.02 * 500 psi of deviation pulls the target 10 °C up; α = 0.85.
        assert!((hot - (85.0 + 10.0 * 0.15)).abs() < 1e-9);
    }

    #[test]
    fn anomaly_applies_fixed_magnitude() {
        let sample = SignalSample {
            hour_of_day: MIDNIGHT,
            noise: 0.0,
            anomaly: true,
        };
        let next = next_gas_detection(5.0, 85.0, &sample);
        assert!((next - (5.0 + 25.0 * 0.2)).abs() < 1e-9);
    }

    #[test]
    fn extreme_inputs_are_clamped() {
        let sample = SignalSample {
            hour_of_day: 6.0,
            noise: 1.0,
            anomaly: true,
        };
        let gas = next_gas_detection(1_000.0, 150.0, &sample);
        assert!(gas <= 100.0);
        let seal = next_seal_integrity(-50.0, 2500.0, 150.0, &sample);
        assert!(seal >= 70.0);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut set = SignalSet::baseline();
        for step in 0..5_000u32 {
            let hour = f64::from(step % 24);
            let samples = [
                SignalSample::draw(&mut rng, ParameterId::BopPressure.spec(), hour),
                SignalSample::draw(&mut rng, ParameterId::WellheadTemperature.spec(), hour),
                SignalSample::draw(&mut rng, ParameterId::GasDetection.spec(), hour),
                SignalSample::draw(&mut rng, ParameterId::SealIntegrity.spec(), hour),
                SignalSample::draw(&mut rng, ParameterId::CorrosionRate.spec(), hour),
                SignalSample::draw(&mut rng, ParameterId::MaintenanceDays.spec(), hour),
            ];
            set = advance_all(&set, &samples);
            for id in ParameterId::all() {
                let spec = id.spec();
                let value = set.get(id);
                assert!(value >= spec.min && value <= spec.max, "{id} = {value}");
            }
        }
    }
}
