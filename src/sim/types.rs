//! Core simulation types: timing configuration, capacity bounds, and trajectories.

use std::fmt;

use crate::controllers::Switch;
use crate::devices::types::PlantState;
use crate::error::{SimError, SimResult, ensure_len, ensure_timestep};

/// Centralized simulation timing.
///
/// # Examples
///
/// ```
/// use energy_control_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(0.25, 42).unwrap();
/// assert_eq!(cfg.steps_per_day(), 96);
/// assert_eq!(cfg.steps_for_days(5), 480);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Duration of one timestep in hours.
    pub dt_hours: f64,
    /// Hour of the first step, measured from midnight of day 0.
    pub start_hour: f64,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a configuration starting at midnight.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NonPositiveTimestep`] when `dt_hours` is not
    /// strictly positive and finite.
    pub fn new(dt_hours: f64, seed: u64) -> SimResult<Self> {
        Ok(Self {
            dt_hours: ensure_timestep(dt_hours)?,
            start_hour: 0.0,
            seed,
        })
    }

    pub fn with_start_hour(mut self, start_hour: f64) -> Self {
        self.start_hour = start_hour;
        self
    }

    /// Steps per day, rounded to the nearest integer.
    pub fn steps_per_day(&self) -> usize {
        (24.0 / self.dt_hours).round() as usize
    }

    /// Number of steps covering `days` whole days.
    pub fn steps_for_days(&self, days: usize) -> usize {
        (24.0 * days as f64 / self.dt_hours).round() as usize
    }

    /// Start time of step `k` (h).
    pub fn time_hr(&self, k: usize) -> f64 {
        self.start_hour + k as f64 * self.dt_hours
    }

    /// `K + 1` grid times `start, start + dt, ..., start + K dt`.
    pub fn time_grid(&self, steps: usize) -> Vec<f64> {
        (0..=steps).map(|k| self.time_hr(k)).collect()
    }
}

/// Per-step admissible action interval `[min[k], max[k]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityBounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl CapacityBounds {
    /// The same interval at every step.
    pub fn constant(min: f64, max: f64, steps: usize) -> Self {
        Self {
            min: vec![min; steps],
            max: vec![max; steps],
        }
    }

    /// Time-varying bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if the two sequences differ in length.
    pub fn per_step(min: Vec<f64>, max: Vec<f64>) -> SimResult<Self> {
        ensure_len("bounds.max", min.len(), max.len())?;
        Ok(Self { min, max })
    }

    /// Lower bound zero, upper bound `capacity * availability[k]`.
    pub fn gated(capacity: f64, availability: &[f64]) -> Self {
        Self {
            min: vec![0.0; availability.len()],
            max: availability.iter().map(|z| capacity * z).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    pub fn min(&self, k: usize) -> f64 {
        self.min[k]
    }

    pub fn max(&self, k: usize) -> f64 {
        self.max[k]
    }

    /// Saturates `action` into step `k`'s interval.
    pub fn clip(&self, k: usize, action: f64) -> f64 {
        action.max(self.min[k]).min(self.max[k])
    }

    /// Checks `min[k] <= max[k]` at every step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InfeasibleBounds`] for the first offending step.
    pub fn validate(&self) -> SimResult<()> {
        for (step, (&min, &max)) in self.min.iter().zip(&self.max).enumerate() {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(SimError::InfeasibleBounds { step, min, max });
            }
        }
        Ok(())
    }
}

/// Complete record of one simulation run.
///
/// `states` and `times_hr` hold `K + 1` entries; every other series holds `K`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<S> {
    /// Time at each state sample (h).
    pub times_hr: Vec<f64>,
    /// State samples, entry 0 is the initial condition.
    pub states: Vec<S>,
    /// Clipped actions applied to the plant.
    pub actions: Vec<f64>,
    /// Actions as the policy requested them, before clipping.
    pub requested: Vec<f64>,
    /// Disturbance at each step.
    pub disturbances: Vec<f64>,
    /// Mode returned by the policy at each step.
    pub modes: Vec<Switch>,
}

impl<S: PlantState> Trajectory<S> {
    pub(crate) fn with_capacity(steps: usize) -> Self {
        Self {
            times_hr: Vec::with_capacity(steps + 1),
            states: Vec::with_capacity(steps + 1),
            actions: Vec::with_capacity(steps),
            requested: Vec::with_capacity(steps),
            disturbances: Vec::with_capacity(steps),
            modes: Vec::with_capacity(steps),
        }
    }

    /// Number of steps `K`.
    pub fn steps(&self) -> usize {
        self.actions.len()
    }

    /// Tracked component of every state (air temperature, stored energy, ...).
    pub fn tracked(&self) -> Vec<f64> {
        self.states.iter().map(PlantState::tracked).collect()
    }

    /// Steps where clipping changed the requested action.
    pub fn saturated_steps(&self) -> usize {
        self.requested
            .iter()
            .zip(&self.actions)
            .filter(|&(&r, &a)| (r - a).abs() > 1e-9 * r.abs().max(1.0))
            .count()
    }

    pub fn final_state(&self) -> Option<&S> {
        self.states.last()
    }
}

impl<S: PlantState> fmt::Display for Trajectory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in 0..self.steps() {
            write!(f, "k={:>5} ({:>8.2}h) |", k, self.times_hr[k])?;
            for (label, value) in S::LABELS.iter().zip(self.states[k].components()) {
                write!(f, " {label}={value:>8.3}")?;
            }
            writeln!(
                f,
                " | u={:>8.3} (req {:>8.3}) w={:>8.3} mode={}",
                self.actions[k], self.requested[k], self.disturbances[k], self.modes[k]
            )?;
        }
        Ok(())
    }
}
