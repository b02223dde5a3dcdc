//! Mock station telemetry.
//!
//! Real bays would report metered energy and gate cameras would report
//! plates. The simulation draws them from a seedable generator instead,
//! behind the [`Telemetry`] trait so the store can be driven by scripted
//! values in tests.

use std::ops::Range;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::StationConfig;

pub trait Telemetry: Send {
    /// kWh a new charging session will stop at.
    fn target_energy(&mut self) -> f64;
    /// kWh delivered during one progress tick.
    fn energy_increment(&mut self) -> f64;
    fn driver_name(&mut self) -> String;
    fn plate(&mut self) -> String;
}

pub struct SeededTelemetry {
    rng: ChaCha8Rng,
    target_energy: Range<f64>,
    increment: Range<f64>,
    drivers: Vec<String>,
}

impl SeededTelemetry {
    /// Build from the configured ranges, seeded from `simulation.seed` when set.
    pub fn new(config: &StationConfig) -> Self {
        let rng = match config.simulation.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_seed(config: &StationConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: &StationConfig, rng: ChaCha8Rng) -> Self {
        let sim = &config.simulation;
        SeededTelemetry {
            rng,
            target_energy: sim.target_energy_min_kwh..sim.target_energy_max_kwh,
            increment: sim.increment_min_kwh..sim.increment_max_kwh,
            drivers: config.drivers.clone(),
        }
    }
}

impl Telemetry for SeededTelemetry {
    fn target_energy(&mut self) -> f64 {
        self.rng.gen_range(self.target_energy.clone())
    }

    fn energy_increment(&mut self) -> f64 {
        self.rng.gen_range(self.increment.clone())
    }

    fn driver_name(&mut self) -> String {
        self.drivers
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| "Unknown".into())
    }

    fn plate(&mut self) -> String {
        format!("A2-{}", self.rng.gen_range(100..1000))
    }
}

/// Deterministic telemetry: every session targets the same energy and
/// increments cycle through a fixed list.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone)]
pub struct ScriptedTelemetry {
    pub target_energy: f64,
    pub increments: Vec<f64>,
    cursor: usize,
    arrivals: usize,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedTelemetry {
    pub fn new(target_energy: f64, increments: Vec<f64>) -> Self {
        ScriptedTelemetry {
            target_energy,
            increments,
            cursor: 0,
            arrivals: 0,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Telemetry for ScriptedTelemetry {
    fn target_energy(&mut self) -> f64 {
        self.target_energy
    }

    fn energy_increment(&mut self) -> f64 {
        if self.increments.is_empty() {
            return 0.0;
        }
        let value = self.increments[self.cursor % self.increments.len()];
        self.cursor += 1;
        value
    }

    fn driver_name(&mut self) -> String {
        "Meron".into()
    }

    fn plate(&mut self) -> String {
        self.arrivals += 1;
        format!("A2-{}", 100 + self.arrivals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_values_stay_in_range() {
        let config = StationConfig::default();
        let mut telemetry = SeededTelemetry::with_seed(&config, 42);

        for _ in 0..500 {
            let target = telemetry.target_energy();
            assert!((40.0..80.0).contains(&target));

            let increment = telemetry.energy_increment();
            assert!((0.5..2.5).contains(&increment));

            assert!(config.drivers.contains(&telemetry.driver_name()));

            let plate = telemetry.plate();
            let number: u32 = plate.strip_prefix("A2-").unwrap().parse().unwrap();
            assert!((100..=999).contains(&number));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let config = StationConfig::default();
        let mut a = SeededTelemetry::with_seed(&config, 7);
        let mut b = SeededTelemetry::with_seed(&config, 7);

        for _ in 0..20 {
            assert_eq!(a.target_energy(), b.target_energy());
            assert_eq!(a.plate(), b.plate());
        }
    }

    #[test]
    fn test_scripted_increments_cycle() {
        let mut telemetry = ScriptedTelemetry::new(50.0, vec![1.0, 2.0]);
        assert_eq!(telemetry.energy_increment(), 1.0);
        assert_eq!(telemetry.energy_increment(), 2.0);
        assert_eq!(telemetry.energy_increment(), 1.0);
        assert_eq!(telemetry.target_energy(), 50.0);
    }
}
