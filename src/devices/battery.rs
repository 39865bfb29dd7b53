use crate::devices::types::Plant;
use crate::error::{SimError, SimResult, ensure_positive};
use crate::sim::discretize::FirstOrder;

/// An electric vehicle battery tracked by its stored chemical energy.
///
/// Continuous-time model `dx/dt = -x/tau + p_chem`, discretized exactly:
///
/// ```text
/// x[k+1] = a x[k] + (1 - a) tau p_chem[k],   a = exp(-dt/tau)
/// ```
///
/// The action is the electrical charging power `u` (kW, positive = charge).
/// Chemical power is `eta_c u` while charging and `u / eta_d` while
/// discharging. The disturbance is `-p_drive`, the chemical power drawn to
/// drive the vehicle.
#[derive(Debug, Clone)]
pub struct EvBattery {
    /// Self-dissipation time constant (h).
    pub tau_hours: f64,
    /// Charging efficiency (0..1].
    pub eta_c: f64,
    /// Discharging efficiency (0..1].
    pub eta_d: f64,
    /// Maximum electrical charging power (kW).
    pub max_charge_kw: f64,
    /// Maximum electrical discharging power (kW, positive magnitude).
    pub max_discharge_kw: f64,
    /// Chemical energy capacity (kWh).
    pub capacity_kwh: f64,
    dynamics: FirstOrder,
}

impl EvBattery {
    /// Creates a battery model at the given step duration.
    ///
    /// # Errors
    ///
    /// Fails when `tau_hours`, `capacity_kwh` or `dt_hours` is not strictly
    /// positive, or an efficiency lies outside `(0, 1]`.
    pub fn new(
        tau_hours: f64,
        eta_c: f64,
        eta_d: f64,
        max_charge_kw: f64,
        max_discharge_kw: f64,
        capacity_kwh: f64,
        dt_hours: f64,
    ) -> SimResult<Self> {
        for (what, eta) in [("ev.eta_c", eta_c), ("ev.eta_d", eta_d)] {
            if !(eta > 0.0 && eta <= 1.0) {
                return Err(SimError::InvalidParameter { what, value: eta });
            }
        }
        if !(max_charge_kw >= 0.0 && max_discharge_kw >= 0.0) {
            return Err(SimError::InvalidParameter {
                what: "ev.max_charge_kw",
                value: max_charge_kw.min(max_discharge_kw),
            });
        }
        let capacity_kwh = ensure_positive("ev.capacity_kwh", capacity_kwh)?;
        let dynamics = FirstOrder::from_time_constant(tau_hours, dt_hours)?;

        Ok(Self {
            tau_hours,
            eta_c,
            eta_d,
            max_charge_kw,
            max_discharge_kw,
            capacity_kwh,
            dynamics,
        })
    }

    /// Discrete-time dynamics parameter `a = exp(-dt/tau)`.
    pub fn a(&self) -> f64 {
        self.dynamics.a
    }

    /// Chemical power delivered to the cells for an electrical power `u`.
    pub fn chemical_kw(&self, electrical_kw: f64) -> f64 {
        if electrical_kw >= 0.0 {
            self.eta_c * electrical_kw
        } else {
            electrical_kw / self.eta_d
        }
    }

    /// Electrical charging power that lands the next state exactly on
    /// `target_kwh`, given the step's disturbance. May be negative or exceed
    /// the charger capacity; callers clip.
    pub fn power_to_reach_kw(&self, x_kwh: f64, target_kwh: f64, disturbance_kw: f64) -> f64 {
        let chem = (target_kwh - self.dynamics.a * x_kwh) / self.dynamics.b - disturbance_kw;
        if chem >= 0.0 {
            chem / self.eta_c
        } else {
            chem * self.eta_d
        }
    }

    /// Returns `true` once the stored energy is at capacity (1e-9 relative slack).
    pub fn is_full(&self, x_kwh: f64) -> bool {
        x_kwh >= self.capacity_kwh * (1.0 - 1e-9)
    }
}

impl Plant for EvBattery {
    type State = f64;

    fn step(&self, state: &f64, action: f64, disturbance: f64, _k: usize) -> SimResult<f64> {
        Ok(self
            .dynamics
            .apply(*state, self.chemical_kw(action) + disturbance))
    }

    fn plant_type(&self) -> &'static str {
        "EvBattery"
    }
}
