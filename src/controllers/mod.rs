//! Control policies that choose one action per step.

/// Daily-deadline EV charging.
pub mod deadline;
/// Threshold-triggered EV charging.
pub mod ev;
/// Precomputed action sequences.
pub mod open_loop;
pub mod perfect_tracking;
/// Hysteresis control.
pub mod thermostat;
pub mod types;
pub mod water_heater;

pub use deadline::DeadlineCharging;
pub use ev::{ChargeBelowMinimum, ChargeWhenPlugged};
pub use open_loop::OpenLoop;
pub use perfect_tracking::PerfectTracking;
pub use thermostat::Thermostat;
pub use types::{Controller, Decision, StepContext, Switch};
pub use water_heater::{HeaterKind, WaterHeaterDispatch};
