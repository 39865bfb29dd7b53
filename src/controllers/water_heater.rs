use super::types::{Controller, Decision, StepContext, Switch};
use crate::devices::WaterHeater;
use crate::error::{SimError, SimResult, ensure_len};

/// Equipment arrangement of a water heater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterKind {
    Resistance,
    HeatPump,
    Hybrid,
}

impl HeaterKind {
    pub fn label(self) -> &'static str {
        match self {
            HeaterKind::Resistance => "resistance",
            HeaterKind::HeatPump => "heat-pump",
            HeaterKind::Hybrid => "hybrid",
        }
    }
}

/// Rule-based dispatch of a heat pump and a backup resistor.
///
/// The heat pump is dispatched first, up to its thermal capacity
/// `cop[k] * ph_max`, to bring the tank back to `x_max`. The resistor only
/// tops up the remainder, up to `pr_max`, while the tank sits below the
/// threshold `x_r` (always, when `x_r` is the tank capacity). The action is
/// the total thermal power (kW).
#[derive(Debug, Clone)]
pub struct WaterHeaterDispatch {
    kind: HeaterKind,
    tank: WaterHeater,
    heat_pump_max_kw: f64,
    resistor_max_kw: f64,
    resistor_threshold_kwh: f64,
    cop: Vec<f64>,
}

impl WaterHeaterDispatch {
    /// Resistor only: `ph_max = 0`, `x_r = x_max`.
    pub fn resistance_only(tank: WaterHeater, resistor_max_kw: f64, cop: Vec<f64>) -> SimResult<Self> {
        let threshold = tank.capacity_kwh();
        Self::build(HeaterKind::Resistance, tank, 0.0, resistor_max_kw, threshold, cop)
    }

    /// Heat pump only: `pr_max = 0`, `x_r = 0`.
    pub fn heat_pump_only(tank: WaterHeater, heat_pump_max_kw: f64, cop: Vec<f64>) -> SimResult<Self> {
        Self::build(HeaterKind::HeatPump, tank, heat_pump_max_kw, 0.0, 0.0, cop)
    }

    /// Heat pump first, resistor below `threshold_kwh`.
    pub fn hybrid(
        tank: WaterHeater,
        heat_pump_max_kw: f64,
        resistor_max_kw: f64,
        threshold_kwh: f64,
        cop: Vec<f64>,
    ) -> SimResult<Self> {
        Self::build(
            HeaterKind::Hybrid,
            tank,
            heat_pump_max_kw,
            resistor_max_kw,
            threshold_kwh,
            cop,
        )
    }

    fn build(
        kind: HeaterKind,
        tank: WaterHeater,
        heat_pump_max_kw: f64,
        resistor_max_kw: f64,
        resistor_threshold_kwh: f64,
        cop: Vec<f64>,
    ) -> SimResult<Self> {
        for (what, value) in [
            ("water_heater.heat_pump_max_kw", heat_pump_max_kw),
            ("water_heater.resistor_max_kw", resistor_max_kw),
            ("water_heater.resistor_threshold_kwh", resistor_threshold_kwh),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidParameter { what, value });
            }
        }
        if let Some(&bad) = cop.iter().find(|&&eta| !(eta.is_finite() && eta > 0.0)) {
            return Err(SimError::InvalidParameter {
                what: "water_heater.cop",
                value: bad,
            });
        }
        Ok(Self {
            kind,
            tank,
            heat_pump_max_kw,
            resistor_max_kw,
            resistor_threshold_kwh,
            cop,
        })
    }

    /// Whether the resistor may run at tank energy `x`.
    ///
    /// A threshold at capacity keeps the resistor available at all times,
    /// so a full tank still covers the draw expected over the step.
    fn resistor_enabled(&self, x: f64) -> bool {
        x < self.resistor_threshold_kwh || self.resistor_threshold_kwh >= self.tank.capacity_kwh()
    }

    pub fn kind(&self) -> HeaterKind {
        self.kind
    }

    /// Thermal capacity available at step `k`, heat pump plus resistor.
    pub fn max_thermal_kw(&self, k: usize) -> f64 {
        self.cop[k] * self.heat_pump_max_kw + self.resistor_max_kw
    }

    /// Splits a thermal action into `(heat pump, resistor)` thermal powers.
    pub fn split_thermal_kw(&self, thermal_kw: f64, k: usize) -> (f64, f64) {
        let heat_pump = thermal_kw.min(self.cop[k] * self.heat_pump_max_kw).max(0.0);
        (heat_pump, (thermal_kw - heat_pump).max(0.0))
    }

    /// Electrical input for a thermal action, heat pump share first.
    ///
    /// `q_hp = min(q, cop ph_max)` and `p = q_hp / cop + (q - q_hp)`.
    pub fn electrical_kw(&self, thermal_kw: f64, k: usize) -> f64 {
        let (heat_pump, resistor) = self.split_thermal_kw(thermal_kw, k);
        heat_pump / self.cop[k] + resistor
    }

    /// Electrical input series for a whole action trajectory.
    pub fn electrical_series(&self, thermal_kw: &[f64]) -> Vec<f64> {
        thermal_kw
            .iter()
            .enumerate()
            .map(|(k, &q)| self.electrical_kw(q, k))
            .collect()
    }
}

impl Controller<f64> for WaterHeaterDispatch {
    fn decide(&self, state: &f64, mode: Switch, ctx: &StepContext) -> Decision {
        let x = *state;
        let needed = self
            .tank
            .heat_to_reach_kw(x, self.tank.capacity_kwh(), ctx.disturbance);
        let heat_pump = needed.clamp(0.0, self.cop[ctx.step] * self.heat_pump_max_kw);
        let resistor = if self.resistor_enabled(x) {
            (needed - heat_pump).max(0.0).min(self.resistor_max_kw)
        } else {
            0.0
        };
        Decision::new(heat_pump + resistor, mode)
    }

    fn check_horizon(&self, steps: usize) -> SimResult<()> {
        ensure_len("cop", steps, self.cop.len())
    }

    fn name(&self) -> &'static str {
        self.kind.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tank() -> WaterHeater {
        WaterHeater::from_geometry(0.19, 0.0005, 52.0, 15.0, 20.0, 5.0 / 60.0).unwrap()
    }

    fn ctx(disturbance: f64) -> StepContext {
        StepContext {
            step: 0,
            time_hr: 0.0,
            disturbance,
            min: 0.0,
            max: 6.0,
        }
    }

    #[test]
    fn resistance_only_fills_up_to_capacity() {
        let t = tank();
        let x = t.capacity_kwh() - 0.05;
        let w = t.disturbance_kw(0.0);
        let needed = t.heat_to_reach_kw(x, t.capacity_kwh(), w);
        let p = WaterHeaterDispatch::resistance_only(t, 4.5, vec![3.0]).unwrap();
        let d = p.decide(&x, Switch::Off, &ctx(w));
        assert_relative_eq!(d.action, needed.min(4.5), epsilon = 1e-12);
        assert_relative_eq!(p.electrical_kw(d.action, 0), d.action, epsilon = 1e-12);
    }

    #[test]
    fn resistance_only_saturates_during_a_draw() {
        let t = tank();
        let x = 2.0;
        let w = t.disturbance_kw(18.0);
        let p = WaterHeaterDispatch::resistance_only(t, 4.5, vec![3.0]).unwrap();
        assert_eq!(p.decide(&x, Switch::Off, &ctx(w)).action, 4.5);
    }

    #[test]
    fn resistance_only_covers_a_draw_from_a_full_tank() {
        let t = tank();
        let cap = t.capacity_kwh();
        let w = t.disturbance_kw(18.0);
        let needed = t.heat_to_reach_kw(cap, cap, w);
        let p = WaterHeaterDispatch::resistance_only(t, 4.5, vec![3.0]).unwrap();
        let d = p.decide(&cap, Switch::Off, &ctx(w));
        assert!(needed > 0.0);
        assert_relative_eq!(d.action, needed.min(4.5), epsilon = 1e-12);
    }

    #[test]
    fn heat_pump_only_is_capped_by_cop() {
        let t = tank();
        let w = t.disturbance_kw(18.0);
        let p = WaterHeaterDispatch::heat_pump_only(t, 0.5, vec![3.0]).unwrap();
        let d = p.decide(&1.0, Switch::Off, &ctx(w));
        assert_relative_eq!(d.action, 1.5);
        assert_relative_eq!(p.electrical_kw(d.action, 0), 0.5);
    }

    #[test]
    fn hybrid_uses_resistor_only_below_threshold() {
        let t = tank();
        let cap = t.capacity_kwh();
        let w = t.disturbance_kw(18.0);
        let p = WaterHeaterDispatch::hybrid(t, 0.5, 4.5, 0.5 * cap, vec![3.0]).unwrap();

        let above = p.decide(&(0.6 * cap), Switch::Off, &ctx(w));
        assert_relative_eq!(above.action, 1.5);

        let below = p.decide(&(0.4 * cap), Switch::Off, &ctx(w));
        assert_relative_eq!(below.action, 6.0);
        let (hp, res) = p.split_thermal_kw(below.action, 0);
        assert_relative_eq!(hp, 1.5);
        assert_relative_eq!(res, 4.5);
        assert_relative_eq!(p.electrical_kw(below.action, 0), 0.5 + 4.5);
    }

    #[test]
    fn full_tank_gets_only_standby_heat() {
        let t = tank();
        let cap = t.capacity_kwh();
        let w = t.disturbance_kw(0.0);
        let needed = t.heat_to_reach_kw(cap, cap, w);
        let p = WaterHeaterDispatch::hybrid(t, 0.5, 4.5, 0.5 * cap, vec![3.0]).unwrap();
        let d = p.decide(&cap, Switch::Off, &ctx(w));
        assert_relative_eq!(d.action, needed.clamp(0.0, 1.5), epsilon = 1e-12);
    }

    #[test]
    fn cop_length_checked_and_positive() {
        let p = WaterHeaterDispatch::heat_pump_only(tank(), 0.5, vec![3.0; 4]).unwrap();
        assert!(p.check_horizon(4).is_ok());
        assert!(p.check_horizon(5).is_err());
        assert!(WaterHeaterDispatch::heat_pump_only(tank(), 0.5, vec![0.0]).is_err());
    }
}
