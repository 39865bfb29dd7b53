use nalgebra::{Matrix2, Vector2};

use super::types::{Controller, Decision, StepContext, Switch};
use crate::devices::Building2R2C;
use crate::error::{SimError, SimResult, ensure_len};

/// One-step-lookahead setpoint tracking for the 2R2C building.
///
/// Picks the HVAC power that puts the next air temperature exactly on the
/// next setpoint, solving `Tset[k+1] = A[0,:] x + B[0] (u + w)` for `u`.
/// Saturation at the capacity bounds is what makes tracking "near" perfect.
#[derive(Debug, Clone)]
pub struct PerfectTracking {
    a: Matrix2<f64>,
    b: Vector2<f64>,
    setpoint: Vec<f64>,
}

impl PerfectTracking {
    /// Creates the policy from discrete dynamics and a setpoint sequence of
    /// length `K + 1` (entry 0 belongs to the initial state).
    ///
    /// # Errors
    ///
    /// Fails when the air-temperature entry of `B` is zero or non-finite.
    pub fn new(a: Matrix2<f64>, b: Vector2<f64>, setpoint: Vec<f64>) -> SimResult<Self> {
        if !b[0].is_finite() || b[0] == 0.0 {
            return Err(SimError::InvalidParameter {
                what: "perfect_tracking.b[0]",
                value: b[0],
            });
        }
        Ok(Self { a, b, setpoint })
    }

    /// Builds the policy around a building's discrete dynamics.
    pub fn for_building(building: &Building2R2C, setpoint: Vec<f64>) -> SimResult<Self> {
        Self::new(*building.a(), *building.b(), setpoint)
    }

    /// Unconstrained action that lands the air temperature on `target`.
    pub fn required_action(&self, state: &Vector2<f64>, target: f64, disturbance: f64) -> f64 {
        let free = self.a[(0, 0)] * state[0] + self.a[(0, 1)] * state[1];
        (target - free) / self.b[0] - disturbance
    }
}

impl Controller<Vector2<f64>> for PerfectTracking {
    fn decide(&self, state: &Vector2<f64>, mode: Switch, ctx: &StepContext) -> Decision {
        let target = self.setpoint[ctx.step + 1];
        Decision::new(self.required_action(state, target, ctx.disturbance), mode)
    }

    fn check_horizon(&self, steps: usize) -> SimResult<()> {
        ensure_len("setpoint", steps + 1, self.setpoint.len())
    }

    fn name(&self) -> &'static str {
        "perfect-tracking"
    }
}
