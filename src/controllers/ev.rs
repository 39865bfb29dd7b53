//! Electric vehicle charging policies.

use super::types::{Controller, Decision, StepContext, Switch};
use crate::devices::EvBattery;
use crate::error::{SimError, SimResult, ensure_positive};

/// Charge at full power whenever plugged in, until the battery is full.
///
/// The requested power is whatever would land the next state exactly on
/// capacity; the engine's bounds `[0, pc_max z[k]]` cap it at the charger
/// rating and zero it while unplugged.
#[derive(Debug, Clone)]
pub struct ChargeWhenPlugged {
    battery: EvBattery,
}

impl ChargeWhenPlugged {
    pub fn new(battery: EvBattery) -> Self {
        Self { battery }
    }
}

impl Controller<f64> for ChargeWhenPlugged {
    fn decide(&self, state: &f64, mode: Switch, ctx: &StepContext) -> Decision {
        let target = self.battery.capacity_kwh;
        let action = self
            .battery
            .power_to_reach_kw(*state, target, ctx.disturbance)
            .max(0.0);
        Decision::new(action, mode)
    }

    fn name(&self) -> &'static str {
        "charge-when-plugged"
    }
}

/// Wait until the stored energy falls below `x_min`, then charge at full
/// power until full.
///
/// The mode latches on crossing `x_min` and stays on, through unplugged
/// periods included, until the battery reports full.
#[derive(Debug, Clone)]
pub struct ChargeBelowMinimum {
    battery: EvBattery,
    min_kwh: f64,
}

impl ChargeBelowMinimum {
    /// # Errors
    ///
    /// Fails unless `0 < min_kwh <= capacity`.
    pub fn new(battery: EvBattery, min_kwh: f64) -> SimResult<Self> {
        let min_kwh = ensure_positive("ev.min_kwh", min_kwh)?;
        if min_kwh > battery.capacity_kwh {
            return Err(SimError::InvalidParameter {
                what: "ev.min_kwh",
                value: min_kwh,
            });
        }
        Ok(Self { battery, min_kwh })
    }

    fn next_mode(&self, x: f64, mode: Switch) -> Switch {
        if x < self.min_kwh {
            Switch::On
        } else if self.battery.is_full(x) {
            Switch::Off
        } else {
            mode
        }
    }
}

impl Controller<f64> for ChargeBelowMinimum {
    fn decide(&self, state: &f64, mode: Switch, ctx: &StepContext) -> Decision {
        let mode = self.next_mode(*state, mode);
        let action = match mode {
            Switch::On => self
                .battery
                .power_to_reach_kw(*state, self.battery.capacity_kwh, ctx.disturbance)
                .max(0.0),
            Switch::Off => 0.0,
        };
        Decision::new(action, mode)
    }

    fn name(&self) -> &'static str {
        "charge-below-minimum"
    }
}
