use super::types::{Controller, Decision, StepContext, Switch};
use crate::devices::types::PlantState;
use crate::error::{SimError, SimResult, ensure_len};

/// Hysteresis (bang-bang) control around a setpoint schedule.
///
/// Turns on below `Tset - dT`, off above `Tset + dT`, and otherwise repeats
/// the previous mode. While on it requests `on_action`, or the step's upper
/// bound when no fixed magnitude is configured.
#[derive(Debug, Clone)]
pub struct Thermostat {
    setpoint: Vec<f64>,
    deadband: f64,
    on_action: Option<f64>,
    initial: Switch,
}

impl Thermostat {
    /// # Errors
    ///
    /// Fails when `deadband` is negative or non-finite.
    pub fn new(setpoint: Vec<f64>, deadband: f64) -> SimResult<Self> {
        if !(deadband.is_finite() && deadband >= 0.0) {
            return Err(SimError::InvalidParameter {
                what: "thermostat.deadband",
                value: deadband,
            });
        }
        Ok(Self {
            setpoint,
            deadband,
            on_action: None,
            initial: Switch::Off,
        })
    }

    /// Requests a fixed magnitude while on instead of the step's maximum.
    pub fn with_on_action(mut self, action: f64) -> Self {
        self.on_action = Some(action);
        self
    }

    pub fn with_initial_mode(mut self, mode: Switch) -> Self {
        self.initial = mode;
        self
    }

    /// Applies the hysteresis rule to a measured value.
    pub fn next_mode(&self, measured: f64, setpoint: f64, mode: Switch) -> Switch {
        if measured < setpoint - self.deadband {
            Switch::On
        } else if measured > setpoint + self.deadband {
            Switch::Off
        } else {
            mode
        }
    }
}

impl<S: PlantState> Controller<S> for Thermostat {
    fn decide(&self, state: &S, mode: Switch, ctx: &StepContext) -> Decision {
        let mode = self.next_mode(state.tracked(), self.setpoint[ctx.step], mode);
        let action = match mode {
            Switch::On => self.on_action.unwrap_or(ctx.max),
            Switch::Off => 0.0,
        };
        Decision::new(action, mode)
    }

    fn initial_mode(&self) -> Switch {
        self.initial
    }

    fn check_horizon(&self, steps: usize) -> SimResult<()> {
        ensure_len("setpoint", steps + 1, self.setpoint.len())
    }

    fn name(&self) -> &'static str {
        "thermostat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    fn ctx() -> StepContext {
        StepContext {
            step: 0,
            time_hr: 0.0,
            disturbance: 0.0,
            min: 0.0,
            max: 14.0,
        }
    }

    fn decide(t: &Thermostat, temp: f64, mode: Switch) -> Decision {
        t.decide(&Vector2::new(temp, temp), mode, &ctx())
    }

    #[test]
    fn turns_on_below_band() {
        let t = Thermostat::new(vec![21.0, 21.0], 0.5).unwrap();
        let d = decide(&t, 20.4, Switch::Off);
        assert_eq!(d.mode, Switch::On);
        assert_eq!(d.action, 14.0);
    }

    #[test]
    fn turns_off_above_band() {
        let t = Thermostat::new(vec![21.0, 21.0], 0.5).unwrap();
        let d = decide(&t, 21.6, Switch::On);
        assert_eq!(d.mode, Switch::Off);
        assert_eq!(d.action, 0.0);
    }

    #[test]
    fn holds_mode_inside_band() {
        let t = Thermostat::new(vec![21.0, 21.0], 0.5).unwrap();
        assert_eq!(decide(&t, 21.2, Switch::On).mode, Switch::On);
        assert_eq!(decide(&t, 20.8, Switch::Off).mode, Switch::Off);
        // Band edges are inclusive.
        assert_eq!(decide(&t, 20.5, Switch::Off).mode, Switch::Off);
        assert_eq!(decide(&t, 21.5, Switch::On).mode, Switch::On);
    }

    #[test]
    fn fixed_on_action() {
        let t = Thermostat::new(vec![21.0, 21.0], 0.5)
            .unwrap()
            .with_on_action(6.0)
            .with_initial_mode(Switch::On);
        assert_eq!(Controller::<f64>::initial_mode(&t), Switch::On);
        assert_eq!(decide(&t, 21.0, Switch::On).action, 6.0);
    }

    #[test]
    fn negative_deadband_rejected() {
        assert!(Thermostat::new(vec![21.0], -0.1).is_err());
    }
}
