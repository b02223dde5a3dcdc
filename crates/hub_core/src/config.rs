use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Station must have at least one charging slot")]
    NoSlots,
    #[error("Driver name pool is empty")]
    EmptyDriverPool,
    #[error("Invalid range for {name}: min {min} must be below max {max}")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("Arrival probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
    #[error("Notification capacity must be greater than zero")]
    NoNotificationCapacity,
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Represents a highway charging station configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StationConfig {
    pub station_name: String,
    /// Number of charging bays, numbered 1..=slot_count
    pub slot_count: u32,
    /// Number of notifications kept, newest first
    pub notification_capacity: usize,
    pub pricing: Pricing,
    pub simulation: SimulationConfig,
    /// Names drawn for simulated truck drivers
    pub drivers: Vec<String>,
}

/// Billing applied when a session is paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pricing {
    /// Price per kWh delivered
    pub rate_per_kwh: f64,
    /// Flat fee added to every completed session
    pub idle_fee: f64,
}

/// Timing and mock-telemetry ranges used by the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub progress_interval_ms: u64,
    pub arrival_min_secs: u64,
    pub arrival_max_secs: u64,
    pub arrival_probability: f64,
    /// Delay between a slot reservation and the automatic start of charging
    pub promote_delay_ms: u64,
    /// Delay between a simulated arrival and its automatic slot assignment
    pub auto_assign_delay_ms: u64,
    pub scheduler_poll_ms: u64,
    pub target_energy_min_kwh: f64,
    pub target_energy_max_kwh: f64,
    pub increment_min_kwh: f64,
    pub increment_max_kwh: f64,
    /// Fixed seed for reproducible runs, entropy when absent
    pub seed: Option<u64>,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            station_name: "Adama Highway Hub".into(),
            slot_count: 10,
            notification_capacity: 50,
            pricing: Pricing::default(),
            simulation: SimulationConfig::default(),
            drivers: [
                "Bekele", "Alazar", "Meron", "Dawit", "Samuel", "Tsion", "Henok", "Yared",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing {
            rate_per_kwh: 0.25,
            idle_fee: 2.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            progress_interval_ms: 2000,
            arrival_min_secs: 20,
            arrival_max_secs: 35,
            arrival_probability: 0.7,
            promote_delay_ms: 2000,
            auto_assign_delay_ms: 1000,
            scheduler_poll_ms: 250,
            target_energy_min_kwh: 40.0,
            target_energy_max_kwh: 80.0,
            increment_min_kwh: 0.5,
            increment_max_kwh: 2.5,
            seed: None,
        }
    }
}

impl Pricing {
    /// Amount due for a session that delivered `energy_kwh`.
    pub fn total(&self, energy_kwh: f64) -> f64 {
        self.energy_cost(energy_kwh) + self.idle_fee
    }

    pub fn energy_cost(&self, energy_kwh: f64) -> f64 {
        energy_kwh * self.rate_per_kwh
    }
}

impl StationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::NoNotificationCapacity);
        }
        if self.drivers.is_empty() {
            return Err(ConfigError::EmptyDriverPool);
        }
        let sim = &self.simulation;
        if sim.progress_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("progressIntervalMs"));
        }
        if sim.scheduler_poll_ms == 0 {
            return Err(ConfigError::ZeroInterval("schedulerPollMs"));
        }
        check_range(
            "arrival seconds",
            sim.arrival_min_secs as f64,
            sim.arrival_max_secs as f64,
        )?;
        check_range(
            "target energy",
            sim.target_energy_min_kwh,
            sim.target_energy_max_kwh,
        )?;
        check_range(
            "energy increment",
            sim.increment_min_kwh,
            sim.increment_max_kwh,
        )?;
        if !(0.0..=1.0).contains(&sim.arrival_probability) {
            return Err(ConfigError::InvalidProbability(sim.arrival_probability));
        }
        Ok(())
    }
}

fn check_range(name: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min < 0.0 || min >= max {
        return Err(ConfigError::InvalidRange { name, min, max });
    }
    Ok(())
}
