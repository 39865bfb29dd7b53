use std::f64::consts::PI;

use nalgebra::Vector1;
use ode_solvers::System;

use crate::devices::types::Plant;
use crate::error::{SimError, SimResult, ensure_len, ensure_positive, ensure_timestep};
use crate::sim::discretize::FirstOrder;
use crate::sim::ode::{ScalarSolver, Tolerances};

/// Seconds in a 365-day year, the climate model's step.
pub const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// Converts Kelvin to Celsius (course convention, 273 offset).
pub fn k2c(kelvin: f64) -> f64 {
    kelvin - 273.0
}

/// Physical constants of the single-layer planetary energy balance.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateConstants {
    /// Albedo of Earth's atmosphere.
    pub albedo: f64,
    /// Solar constant (W/m²).
    pub solar_constant: f64,
    /// Preindustrial-style baseline atmospheric emissivity.
    pub emissivity: f64,
    /// Stefan-Boltzmann constant (W/m²/K⁴).
    pub stefan_boltzmann: f64,
    /// Density of water (kg/m³).
    pub water_density: f64,
    /// Specific heat of water (J/kg/K).
    pub water_specific_heat: f64,
    /// Radius of Earth (m).
    pub earth_radius: f64,
    /// Depth of the well-mixed ocean layer (m).
    pub mixed_layer_depth: f64,
}

impl Default for ClimateConstants {
    fn default() -> Self {
        Self {
            albedo: 0.3,
            solar_constant: 1366.0,
            emissivity: 0.767,
            stefan_boltzmann: 5.67e-8,
            water_density: 997.0,
            water_specific_heat: 4186.0,
            earth_radius: 6.378e6,
            mixed_layer_depth: 70.0,
        }
    }
}

impl ClimateConstants {
    /// Thermal capacitance of the surface, 70% of it ocean (J/K).
    pub fn capacitance(&self) -> f64 {
        0.7 * 4.0 * PI
            * self.earth_radius.powi(2)
            * self.water_density
            * self.water_specific_heat
            * self.mixed_layer_depth
    }

    /// Radiative coefficient `beta = 4 sigma pi R² / C` (1/K³/s).
    pub fn beta(&self) -> f64 {
        4.0 * self.stefan_boltzmann * PI * self.earth_radius.powi(2) / self.capacitance()
    }

    /// Continuous-time absorbed solar forcing `(1 - alpha) S pi R² / C` (K/s).
    pub fn solar_forcing(&self, albedo: f64) -> f64 {
        (1.0 - albedo) * self.solar_constant * PI * self.earth_radius.powi(2) / self.capacitance()
    }

    /// Steady-state surface temperature for a given emissivity (K).
    pub fn equilibrium_temperature(&self, emissivity: f64) -> f64 {
        ((1.0 - self.albedo) * self.solar_constant
            / (4.0 * (1.0 - emissivity / 2.0) * self.stefan_boltzmann))
            .powf(0.25)
    }

    /// Emissivity that holds a surface temperature in steady state.
    pub fn emissivity_for_temperature(&self, kelvin: f64) -> f64 {
        2.0 * (1.0
            - (1.0 - self.albedo) * self.solar_constant
                / (4.0 * self.stefan_boltzmann * kelvin.powi(4)))
    }

    /// Linear emissivity-vs-CO₂ fit `eps = eps0 + slope * ppm`.
    ///
    /// Anchored at the 1880-1900 average (286.7 K, 293.5 ppm) and 2022
    /// (287.8 K, 418.56 ppm).
    pub fn emissivity_fit(&self) -> EmissivityFit {
        let (t1, c1) = (286.7, (291.0 + 296.0) / 2.0);
        let (t2, c2) = (287.8, 418.56);
        let eps1 = self.emissivity_for_temperature(t1);
        let eps2 = self.emissivity_for_temperature(t2);
        let slope = (eps2 - eps1) / (c2 - c1);
        EmissivityFit {
            intercept: eps1 - slope * c1,
            slope,
        }
    }
}

/// Straight-line atmospheric emissivity as a function of CO₂ (ppm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissivityFit {
    pub intercept: f64,
    pub slope: f64,
}

impl EmissivityFit {
    pub fn emissivity(&self, co2_ppm: f64) -> f64 {
        self.intercept + self.slope * co2_ppm
    }
}

/// Nonlinear planetary energy balance `dx/dt = wt - beta (1 - u/2) x⁴`.
///
/// The state is the global average surface temperature (K), the action is
/// the atmospheric emissivity and the disturbance is the absorbed solar
/// forcing (K/s). Each step integrates the ODE with an adaptive
/// Dormand-Prince solver, holding `u` and `wt` at their step values.
#[derive(Debug, Clone)]
pub struct ClimateModel {
    /// Radiative coefficient (1/K³/s).
    pub beta: f64,
    /// Step duration (s).
    pub dt_seconds: f64,
    solver: ScalarSolver,
}

impl ClimateModel {
    /// Creates a model from its radiative coefficient and step duration.
    ///
    /// # Errors
    ///
    /// Fails when `beta` or `dt_seconds` is not strictly positive.
    pub fn new(beta: f64, dt_seconds: f64) -> SimResult<Self> {
        let beta = ensure_positive("climate.beta", beta)?;
        let dt_seconds = ensure_timestep(dt_seconds)?;
        Ok(Self {
            beta,
            dt_seconds,
            solver: ScalarSolver::default(),
        })
    }

    /// Overrides the integrator tolerances and per-step budget.
    pub fn with_solver(mut self, tol: Tolerances, max_steps: usize) -> Self {
        self.solver = ScalarSolver::new(tol).with_max_steps(max_steps);
        self
    }

    /// Right-hand side `f(x, u, wt)`.
    pub fn drift(&self, kelvin: f64, emissivity: f64, forcing: f64) -> f64 {
        forcing - self.beta * (1.0 - emissivity / 2.0) * kelvin.powi(4)
    }

    /// Partial derivative of the drift with respect to the state.
    pub fn drift_dx(&self, kelvin: f64, emissivity: f64) -> f64 {
        -4.0 * self.beta * (1.0 - emissivity / 2.0) * kelvin.powi(3)
    }

    /// Partial derivative of the drift with respect to the emissivity.
    pub fn drift_du(&self, kelvin: f64) -> f64 {
        self.beta * kelvin.powi(4) / 2.0
    }

    /// Small-signal companion of a nominal trajectory.
    ///
    /// Propagates `dδx/dt = f_x δx + f_u δu + δwt` with the Jacobians taken
    /// at the midpoint of each nominal step and discretized exactly over the
    /// step. Returns `x_hat + δx` (K+1 entries).
    ///
    /// # Arguments
    ///
    /// * `x_hat` - Nominal temperatures (K+1, K)
    /// * `u_hat` - Nominal emissivities (K)
    /// * `du` - Emissivity perturbations (K)
    /// * `dwt` - Forcing perturbations (K, K/s)
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] when the sequences disagree and
    /// [`SimError::InvalidParameter`] when the state Jacobian is not stable
    /// (non-positive nominal temperature).
    pub fn linearized_trajectory(
        &self,
        x_hat: &[f64],
        u_hat: &[f64],
        du: &[f64],
        dwt: &[f64],
    ) -> SimResult<Vec<f64>> {
        let steps = u_hat.len();
        ensure_len("x_hat", steps + 1, x_hat.len())?;
        ensure_len("du", steps, du.len())?;
        ensure_len("dwt", steps, dwt.len())?;

        let mut dx = 0.0;
        let mut x_lin = Vec::with_capacity(steps + 1);
        x_lin.push(x_hat[0]);
        for k in 0..steps {
            let x_mid = 0.5 * (x_hat[k] + x_hat[k + 1]);
            let fx = self.drift_dx(x_mid, u_hat[k]);
            if fx.is_nan() || fx >= 0.0 {
                return Err(SimError::InvalidParameter {
                    what: "climate jacobian",
                    value: fx,
                });
            }
            let step = FirstOrder::from_time_constant(-1.0 / fx, self.dt_seconds)?;
            dx = step.apply(dx, self.drift_du(x_mid) * du[k] + dwt[k]);
            x_lin.push(x_hat[k + 1] + dx);
        }
        Ok(x_lin)
    }
}

/// Right-hand side over one step, with the action and forcing held.
struct RadiativeBalance<'a> {
    model: &'a ClimateModel,
    emissivity: f64,
    forcing: f64,
}

impl System<f64, Vector1<f64>> for RadiativeBalance<'_> {
    fn system(&self, _t: f64, x: &Vector1<f64>, dx: &mut Vector1<f64>) {
        dx[0] = self.model.drift(x[0], self.emissivity, self.forcing);
    }
}

impl Plant for ClimateModel {
    type State = f64;

    fn step(&self, state: &f64, action: f64, disturbance: f64, k: usize) -> SimResult<f64> {
        let balance = RadiativeBalance {
            model: self,
            emissivity: action,
            forcing: disturbance,
        };
        self.solver
            .integrate(balance, 0.0, self.dt_seconds, *state)
            .map_err(|e| SimError::Integration {
                step: k,
                reason: e.to_string(),
            })
    }

    fn plant_type(&self) -> &'static str {
        "ClimateModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> ClimateModel {
        ClimateModel::new(ClimateConstants::default().beta(), SECONDS_PER_YEAR).unwrap()
    }

    #[test]
    fn beta_simplifies_to_material_constants() {
        let c = ClimateConstants::default();
        let expected = c.stefan_boltzmann
            / (0.7 * c.water_density * c.water_specific_heat * c.mixed_layer_depth);
        assert_relative_eq!(c.beta(), expected, max_relative = 1e-12);
    }

    #[test]
    fn equilibrium_is_a_fixed_point() {
        let c = ClimateConstants::default();
        let m = model();
        let x0 = c.equilibrium_temperature(c.emissivity);
        let wt = c.solar_forcing(c.albedo);
        assert_relative_eq!(m.drift(x0, c.emissivity, wt), 0.0, epsilon = 1e-18);
        let next = m.step(&x0, c.emissivity, wt, 0).unwrap();
        assert_relative_eq!(next, x0, epsilon = 1e-6);
    }

    #[test]
    fn higher_emissivity_warms_the_surface() {
        let c = ClimateConstants::default();
        let m = model();
        let x0 = c.equilibrium_temperature(c.emissivity);
        let wt = c.solar_forcing(c.albedo);
        let next = m.step(&x0, c.emissivity + 0.01, wt, 0).unwrap();
        assert!(next > x0);
        assert!(next < c.equilibrium_temperature(c.emissivity + 0.01));
    }

    #[test]
    fn emissivity_fit_passes_through_anchors() {
        let c = ClimateConstants::default();
        let fit = c.emissivity_fit();
        let eps = fit.emissivity(418.56);
        assert_relative_eq!(c.equilibrium_temperature(eps), 287.8, epsilon = 1e-9);
        assert!(fit.slope > 0.0);
    }

    #[test]
    fn kelvin_to_celsius() {
        assert_eq!(k2c(288.0), 15.0);
    }

    #[test]
    fn exhausted_budget_is_integration_error() {
        let c = ClimateConstants::default();
        let m = model().with_solver(Tolerances { abs: 1e-14, rel: 1e-15 }, 1);
        let err = m.step(&300.0, 0.5, c.solar_forcing(0.3), 7).unwrap_err();
        assert!(matches!(err, SimError::Integration { step: 7, .. }));
    }

    #[test]
    fn linearization_with_zero_perturbation_reproduces_nominal() {
        let x_hat = [287.0, 287.1, 287.2];
        let u_hat = [0.77, 0.771];
        let x_lin = model()
            .linearized_trajectory(&x_hat, &u_hat, &[0.0, 0.0], &[0.0, 0.0])
            .unwrap();
        assert_eq!(x_lin, x_hat.to_vec());
    }

    #[test]
    fn linearization_checks_lengths() {
        let err = model()
            .linearized_trajectory(&[287.0, 287.1], &[0.77, 0.77], &[0.0, 0.0], &[0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, SimError::LengthMismatch { what: "x_hat", .. }));
    }
}
