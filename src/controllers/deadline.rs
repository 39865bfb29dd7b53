use super::types::{Controller, Decision, StepContext, Switch};
use crate::devices::EvBattery;
use crate::error::{SimError, SimResult, ensure_positive, ensure_timestep};

/// Hours from `time_hr` until the next occurrence of `deadline_hour`.
///
/// A step that starts on the deadline (within half a step) plans for the
/// following day's deadline, so the result lies in `(dt/2, 24 + dt/2]`.
pub fn hours_until_deadline(time_hr: f64, deadline_hour: f64, dt_hours: f64) -> f64 {
    let remaining = (deadline_hour - time_hr).rem_euclid(24.0);
    if remaining < 0.5 * dt_hours || 24.0 - remaining < 0.5 * dt_hours {
        24.0
    } else {
        remaining
    }
}

/// Constant chemical power that closes `deficit_kwh` in `remaining_hours`.
///
/// Zero or negative deficits need no power.
pub fn required_rate_kw(deficit_kwh: f64, remaining_hours: f64) -> f64 {
    if deficit_kwh <= 0.0 {
        0.0
    } else {
        deficit_kwh / remaining_hours
    }
}

/// Charge just fast enough to reach `x_star` by a daily deadline.
///
/// The mode latches on when the stored energy drops below `x_min` and off
/// once it reaches `x_star`. While on, the rate is recomputed every step
/// from the current deficit and the time left before the deadline.
#[derive(Debug, Clone)]
pub struct DeadlineCharging {
    battery: EvBattery,
    min_kwh: f64,
    target_kwh: f64,
    deadline_hour: f64,
    dt_hours: f64,
}

impl DeadlineCharging {
    /// # Arguments
    ///
    /// * `battery` - Battery model, supplies `eta_c`
    /// * `min_kwh` - Energy below which charging is armed
    /// * `target_kwh` - Energy wanted at the deadline
    /// * `deadline_hour` - Hour of day of the deadline, in `[0, 24)`
    /// * `dt_hours` - Step duration
    ///
    /// # Errors
    ///
    /// Fails for a deadline outside `[0, 24)`, a target below the minimum or
    /// above capacity, or a non-positive step.
    pub fn new(
        battery: EvBattery,
        min_kwh: f64,
        target_kwh: f64,
        deadline_hour: f64,
        dt_hours: f64,
    ) -> SimResult<Self> {
        let min_kwh = ensure_positive("ev.min_kwh", min_kwh)?;
        let dt_hours = ensure_timestep(dt_hours)?;
        if !(target_kwh >= min_kwh && target_kwh <= battery.capacity_kwh) {
            return Err(SimError::InvalidParameter {
                what: "ev.target_kwh",
                value: target_kwh,
            });
        }
        if !(0.0..24.0).contains(&deadline_hour) {
            return Err(SimError::InvalidParameter {
                what: "ev.deadline_hour",
                value: deadline_hour,
            });
        }
        Ok(Self {
            battery,
            min_kwh,
            target_kwh,
            deadline_hour,
            dt_hours,
        })
    }

    fn reached_target(&self, x: f64) -> bool {
        x >= self.target_kwh * (1.0 - 1e-9)
    }
}

impl Controller<f64> for DeadlineCharging {
    fn decide(&self, state: &f64, mode: Switch, ctx: &StepContext) -> Decision {
        let x = *state;
        let mode = if x < self.min_kwh {
            Switch::On
        } else if self.reached_target(x) {
            Switch::Off
        } else {
            mode
        };

        let action = match mode {
            Switch::On => {
                let remaining =
                    hours_until_deadline(ctx.time_hr, self.deadline_hour, self.dt_hours);
                required_rate_kw(self.target_kwh - x, remaining) / self.battery.eta_c
            }
            Switch::Off => 0.0,
        };
        Decision::new(action, mode)
    }

    fn name(&self) -> &'static str {
        "deadline"
    }
}
