use nalgebra::{Matrix2, Vector2};

use crate::devices::types::Plant;
use crate::error::{SimResult, ensure_positive};
use crate::sim::discretize::{DiscreteLti, discretize};

/// A building envelope modelled as a 2R2C thermal circuit.
///
/// The state is `[indoor air temperature, thermal mass temperature]` in °C.
/// Continuous-time dynamics:
///
/// ```text
/// C  dT/dt  = (Tout - T)/R + (Tm - T)/Rm + qc + qe
/// Cm dTm/dt = (T - Tm)/Rm
/// ```
///
/// The disturbance `w = qe + Tout/R` (kW) enters through the same column as
/// the HVAC thermal power `qc`, so one step is `x⁺ = A x + B (qc + w)`.
#[derive(Debug, Clone)]
pub struct Building2R2C {
    /// Indoor-outdoor thermal resistance (°C/kW).
    pub r: f64,
    /// Indoor-mass thermal resistance (°C/kW).
    pub rm: f64,
    /// Air thermal capacitance (kWh/°C).
    pub c: f64,
    /// Mass thermal capacitance (kWh/°C).
    pub cm: f64,
    /// Discrete dynamics at the configured step.
    discrete: DiscreteLti<2>,
}

impl Building2R2C {
    /// Creates a building from its resistances and capacitances.
    ///
    /// # Arguments
    ///
    /// * `r` - Indoor-outdoor resistance (°C/kW)
    /// * `rm` - Indoor-mass resistance (°C/kW)
    /// * `c` - Air capacitance (kWh/°C)
    /// * `cm` - Mass capacitance (kWh/°C)
    /// * `dt_hours` - Step duration (h)
    ///
    /// # Errors
    ///
    /// Fails when any parameter or the step is not strictly positive.
    pub fn new(r: f64, rm: f64, c: f64, cm: f64, dt_hours: f64) -> SimResult<Self> {
        let r = ensure_positive("building.r", r)?;
        let rm = ensure_positive("building.rm", rm)?;
        let c = ensure_positive("building.c", c)?;
        let cm = ensure_positive("building.cm", cm)?;
        let (ac, bc) = Self::continuous(r, rm, c, cm);
        let discrete = discretize(&ac, &bc, dt_hours)?;
        Ok(Self {
            r,
            rm,
            c,
            cm,
            discrete,
        })
    }

    /// Derives the circuit from floor area (m²) and number of stories.
    ///
    /// `C = 0.0125 Af`, `Cm = 12 C`, `R = 1 / (0.016 sqrt(N Af))`, `Rm = R / 6`.
    pub fn from_floor_area(floor_area_m2: f64, stories: u32, dt_hours: f64) -> SimResult<Self> {
        let floor_area_m2 = ensure_positive("building.floor_area_m2", floor_area_m2)?;
        let c = 0.0125 * floor_area_m2;
        let r = 1.0 / (0.016 * (f64::from(stories) * floor_area_m2).sqrt());
        Self::new(r, r / 6.0, c, 12.0 * c, dt_hours)
    }

    /// Continuous-time generator `(Ac, Bc)` in units of 1/h and °C/kWh.
    pub fn continuous(r: f64, rm: f64, c: f64, cm: f64) -> (Matrix2<f64>, Vector2<f64>) {
        let ac = Matrix2::new(
            -(1.0 / r + 1.0 / rm) / c,
            1.0 / (rm * c),
            1.0 / (rm * cm),
            -1.0 / (rm * cm),
        );
        let bc = Vector2::new(1.0 / c, 0.0);
        (ac, bc)
    }

    /// Discrete-time dynamics matrix.
    pub fn a(&self) -> &Matrix2<f64> {
        &self.discrete.a
    }

    /// Discrete-time input matrix.
    pub fn b(&self) -> &Vector2<f64> {
        &self.discrete.b
    }

    /// Disturbance `w = qe + Tout/R` for one step.
    pub fn disturbance_kw(&self, exogenous_kw: f64, outdoor_c: f64) -> f64 {
        exogenous_kw + outdoor_c / self.r
    }
}

impl Plant for Building2R2C {
    type State = Vector2<f64>;

    fn step(
        &self,
        state: &Vector2<f64>,
        action: f64,
        disturbance: f64,
        _k: usize,
    ) -> SimResult<Vector2<f64>> {
        Ok(self.discrete.a * state + self.discrete.b * (action + disturbance))
    }

    fn plant_type(&self) -> &'static str {
        "Building2R2C"
    }
}
