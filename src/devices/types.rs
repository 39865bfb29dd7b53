//! Common types and traits for the physical plant models.

use std::fmt;

use nalgebra::Vector2;
use rand::{Rng, rngs::StdRng};

use crate::error::SimResult;

/// A physical state that the engine can record, export and track.
///
/// Scalar plants (stored energy, surface temperature) use `f64`; the 2R2C
/// building uses `Vector2<f64>` holding `[air, mass]` temperatures.
pub trait PlantState: Clone + fmt::Debug {
    /// Column labels for each state component, in [`PlantState::components`] order.
    const LABELS: &'static [&'static str];

    /// Returns the state components as a flat vector.
    fn components(&self) -> Vec<f64>;

    /// The component a setpoint or threshold acts on (the first one).
    fn tracked(&self) -> f64;
}

impl PlantState for f64 {
    const LABELS: &'static [&'static str] = &["x"];

    fn components(&self) -> Vec<f64> {
        vec![*self]
    }

    fn tracked(&self) -> f64 {
        *self
    }
}

impl PlantState for Vector2<f64> {
    const LABELS: &'static [&'static str] = &["air", "mass"];

    fn components(&self) -> Vec<f64> {
        vec![self[0], self[1]]
    }

    fn tracked(&self) -> f64 {
        self[0]
    }
}

/// Trait defining a plant whose state advances one step at a time.
///
/// Implementations are pure: `step` reads its inputs and returns the next
/// state without mutating the plant, so one plant can drive any number of
/// independent runs.
pub trait Plant {
    /// State carried from step to step.
    type State: PlantState;

    /// Advances `state` by one step with the committed `action` and the
    /// step's exogenous `disturbance`.
    ///
    /// # Arguments
    ///
    /// * `state` - State at step `k`
    /// * `action` - Clipped control action at step `k`
    /// * `disturbance` - Exogenous input at step `k`
    /// * `k` - Step index, used only to report failures
    ///
    /// # Errors
    ///
    /// Only plants that integrate numerically can fail; see
    /// [`crate::error::SimError::Integration`].
    fn step(
        &self,
        state: &Self::State,
        action: f64,
        disturbance: f64,
        k: usize,
    ) -> SimResult<Self::State>;

    /// Returns a human-readable type name for the plant.
    fn plant_type(&self) -> &'static str;
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
