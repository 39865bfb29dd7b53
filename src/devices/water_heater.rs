use std::f64::consts::PI;

use crate::devices::types::Plant;
use crate::error::{SimResult, ensure_positive};
use crate::sim::discretize::FirstOrder;

/// Tank height used to derive wall area from volume (m).
const TANK_HEIGHT_M: f64 = 1.5;

/// Volumetric heat capacity of water (kWh/m³/°C).
const WATER_KWH_PER_M3_C: f64 = 1.2;

/// An electric storage water heater tracked by its stored thermal energy.
///
/// The state `x = C (T - Tc)` (kWh) is the energy above the inlet water
/// temperature. Continuous-time model `dx/dt = -alpha x + q + w` with
/// `alpha = 1/(R C)`; the disturbance `w = (Ta - Tc)/R - q_draw` combines
/// standby gains from the ambient air with hot-water withdrawals.
#[derive(Debug, Clone)]
pub struct WaterHeater {
    /// Tank wall thermal resistance (°C/kW).
    pub r: f64,
    /// Water thermal capacitance (kWh/°C).
    pub c: f64,
    /// Hot water setpoint temperature (°C).
    pub hot_c: f64,
    /// Inlet (cold) water temperature (°C).
    pub inlet_c: f64,
    /// Ambient air temperature around the tank (°C).
    pub ambient_c: f64,
    dynamics: FirstOrder,
}

impl WaterHeater {
    /// Creates a tank from its resistance and capacitance.
    ///
    /// # Errors
    ///
    /// Fails when `r`, `c`, `dt_hours` or `hot_c - inlet_c` is not strictly positive.
    pub fn new(
        r: f64,
        c: f64,
        hot_c: f64,
        inlet_c: f64,
        ambient_c: f64,
        dt_hours: f64,
    ) -> SimResult<Self> {
        let r = ensure_positive("water_heater.r", r)?;
        let c = ensure_positive("water_heater.c", c)?;
        ensure_positive("water_heater.hot_c - inlet_c", hot_c - inlet_c)?;
        let dynamics = FirstOrder::from_time_constant(r * c, dt_hours)?;
        Ok(Self {
            r,
            c,
            hot_c,
            inlet_c,
            ambient_c,
            dynamics,
        })
    }

    /// Derives `R` and `C` from tank volume (m³) and wall transmittance (kW/m²/°C).
    ///
    /// The tank is a cylinder of fixed height; `A = 2 V (1/r + 1/h)`,
    /// `R = 1/(U A)` and `C = 1.2 V`.
    pub fn from_geometry(
        volume_m3: f64,
        transmittance: f64,
        hot_c: f64,
        inlet_c: f64,
        ambient_c: f64,
        dt_hours: f64,
    ) -> SimResult<Self> {
        let (r, c) = tank_resistance_capacitance(volume_m3, transmittance)?;
        Self::new(r, c, hot_c, inlet_c, ambient_c, dt_hours)
    }

    /// Continuous-time dynamics parameter `alpha = 1/(R C)` (1/h).
    pub fn alpha(&self) -> f64 {
        1.0 / (self.r * self.c)
    }

    /// Discrete-time dynamics parameter `a = exp(-alpha dt)`.
    pub fn a(&self) -> f64 {
        self.dynamics.a
    }

    /// Tank energy capacity `C (Th - Tc)` (kWh).
    pub fn capacity_kwh(&self) -> f64 {
        self.c * (self.hot_c - self.inlet_c)
    }

    /// Disturbance for one step given the hot water thermal draw (kW).
    pub fn disturbance_kw(&self, draw_kw: f64) -> f64 {
        (self.ambient_c - self.inlet_c) / self.r - draw_kw
    }

    /// Thermal power that lands the next state exactly on `target_kwh`.
    pub fn heat_to_reach_kw(&self, x_kwh: f64, target_kwh: f64, disturbance_kw: f64) -> f64 {
        (target_kwh - self.dynamics.a * x_kwh) / self.dynamics.b - disturbance_kw
    }
}

/// Wall resistance (°C/kW) and capacitance (kWh/°C) of a cylindrical tank.
pub fn tank_resistance_capacitance(volume_m3: f64, transmittance: f64) -> SimResult<(f64, f64)> {
    let volume_m3 = ensure_positive("water_heater.volume_m3", volume_m3)?;
    let transmittance = ensure_positive("water_heater.transmittance", transmittance)?;
    let radius = (volume_m3 / (PI * TANK_HEIGHT_M)).sqrt();
    let area = 2.0 * volume_m3 * (1.0 / radius + 1.0 / TANK_HEIGHT_M);
    Ok((1.0 / (transmittance * area), WATER_KWH_PER_M3_C * volume_m3))
}

impl Plant for WaterHeater {
    type State = f64;

    fn step(&self, state: &f64, action: f64, disturbance: f64, _k: usize) -> SimResult<f64> {
        Ok(self.dynamics.apply(*state, action + disturbance))
    }

    fn plant_type(&self) -> &'static str {
        "WaterHeater"
    }
}
