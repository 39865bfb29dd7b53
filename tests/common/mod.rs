//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use nalgebra::Vector2;

use energy_control_sim::config::{
    BuildingConfig, ClimateConfig, EvConfig, ScenarioConfig, WaterHeaterConfig,
};
use energy_control_sim::devices::{Building2R2C, EvBattery, WaterHeater};
use energy_control_sim::runner::PolicyRun;
use energy_control_sim::sim::types::SimConfig;

/// Baseline house (200 m², two stories) at 15-minute steps.
pub fn default_building() -> Building2R2C {
    Building2R2C::from_floor_area(200.0, 2, 0.25).unwrap()
}

/// 80 kWh battery, 11.5 kW charger, 95% efficiency, one-minute steps.
pub fn default_battery() -> EvBattery {
    EvBattery::new(1600.0, 0.95, 0.95, 11.5, 0.0, 80.0, 1.0 / 60.0).unwrap()
}

/// 190 l tank at five-minute steps.
pub fn default_tank() -> WaterHeater {
    WaterHeater::from_geometry(0.19, 0.0005, 52.0, 15.0, 20.0, 5.0 / 60.0).unwrap()
}

pub fn config(dt_hours: f64) -> SimConfig {
    SimConfig::new(dt_hours, 42).unwrap()
}

/// One-day versions of every experiment, for fast end-to-end runs.
pub fn short_scenario(seed: u64) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.seed = seed;
    cfg.building = BuildingConfig {
        days: 1,
        ..BuildingConfig::default()
    };
    cfg.ev = EvConfig {
        days: 1,
        dt_hours: 0.25,
        ..EvConfig::default()
    };
    cfg.water_heater = WaterHeaterConfig {
        days: 1,
        ..WaterHeaterConfig::default()
    };
    cfg.climate = ClimateConfig {
        steps: 10,
        ..ClimateConfig::default()
    };
    cfg
}

/// `true` when `action` lies in `[min, max]` up to rounding.
pub fn within(action: f64, min: f64, max: f64) -> bool {
    let slack = 1e-9 * (1.0 + min.abs().max(max.abs()));
    action >= min - slack && action <= max + slack
}

pub fn air(state: &Vector2<f64>) -> f64 {
    state[0]
}

/// Asserts two experiment runs match exactly, policy by policy.
pub fn assert_identical_runs<S: PartialEq + std::fmt::Debug>(a: &[PolicyRun<S>], b: &[PolicyRun<S>]) {
    assert_eq!(a.len(), b.len());
    for (ra, rb) in a.iter().zip(b) {
        assert_eq!(ra.trajectory.states, rb.trajectory.states, "{}", ra.kpis.policy);
        assert_eq!(ra.trajectory.actions, rb.trajectory.actions, "{}", ra.kpis.policy);
        assert_eq!(ra.trajectory.disturbances, rb.trajectory.disturbances);
        assert_eq!(ra.kpis, rb.kpis);
        assert_eq!(ra.series, rb.series);
    }
}
