//! Controller contract shared by every control policy.

use std::fmt;

use crate::devices::types::PlantState;
use crate::error::SimResult;

/// Persistent on/off flag carried between steps by latching policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Switch {
    #[default]
    Off,
    On,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Switch::Off => write!(f, "off"),
            Switch::On => write!(f, "on"),
        }
    }
}

/// Read-only inputs for one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Step index `k`.
    pub step: usize,
    /// Time at the start of the step (h).
    pub time_hr: f64,
    /// Disturbance acting over the step.
    pub disturbance: f64,
    /// Lower capacity bound for the step.
    pub min: f64,
    /// Upper capacity bound for the step.
    pub max: f64,
}

impl StepContext {
    /// Saturates `action` to `[min, max]`.
    pub fn clip(&self, action: f64) -> f64 {
        action.max(self.min).min(self.max)
    }
}

/// Output of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Requested action, before the engine saturates it.
    pub action: f64,
    /// Mode to carry into the next step.
    pub mode: Switch,
}

impl Decision {
    pub fn new(action: f64, mode: Switch) -> Self {
        Self { action, mode }
    }
}

/// Trait implemented by every control policy.
///
/// A policy is a pure function of the state, the carried mode and the step
/// context. The engine owns the mode between steps and saturates the
/// returned action to the step's bounds before it reaches the plant.
pub trait Controller<S: PlantState> {
    /// Selects the action for one step.
    fn decide(&self, state: &S, mode: Switch, ctx: &StepContext) -> Decision;

    /// Mode before the first step.
    fn initial_mode(&self) -> Switch {
        Switch::Off
    }

    /// Rejects horizons the policy's own per-step data cannot cover.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::LengthMismatch`] when a schedule held
    /// by the policy does not match `steps`.
    fn check_horizon(&self, _steps: usize) -> SimResult<()> {
        Ok(())
    }

    /// Returns a short policy name for logs and reports.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_switch_is_off() {
        assert_eq!(Switch::default(), Switch::Off);
        assert!(Switch::On.is_on());
        assert_eq!(Switch::On.to_string(), "on");
    }

    #[test]
    fn clip_saturates_both_sides() {
        let ctx = StepContext {
            step: 0,
            time_hr: 0.0,
            disturbance: 0.0,
            min: 0.0,
            max: 14.0,
        };
        assert_eq!(ctx.clip(-3.0), 0.0);
        assert_eq!(ctx.clip(20.0), 14.0);
        assert_eq!(ctx.clip(7.5), 7.5);
    }
}
