use std::f64::consts::PI;

use crate::devices::climate::ClimateConstants;

/// First calendar year of the climate experiment.
pub const START_YEAR: f64 = 2022.0;

/// Nominal and perturbed inputs of the yearly climate experiment.
///
/// Sequences indexed by step hold `K` entries; `years` holds `K + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateInputs {
    /// Calendar year at each state sample.
    pub years: Vec<f64>,
    /// Nominal emissivity ramp.
    pub emissivity_nominal: Vec<f64>,
    /// Emissivity falling at half the nominal growth rate, with a decadal wobble.
    pub emissivity: Vec<f64>,
    pub albedo_nominal: Vec<f64>,
    /// Albedo with a yearly wobble.
    pub albedo: Vec<f64>,
    /// Nominal absorbed solar forcing (K/s).
    pub forcing_nominal: Vec<f64>,
    /// Perturbed absorbed solar forcing (K/s).
    pub forcing: Vec<f64>,
    /// Equilibrium temperature for the baseline emissivity (K).
    pub initial_kelvin: f64,
}

impl ClimateInputs {
    /// Builds the inputs for `steps` yearly steps.
    ///
    /// The nominal emissivity grows linearly from the baseline at the rate
    /// implied by the recent CO₂ trend. The perturbed emissivity instead
    /// falls at half that rate and is modulated by 1% on a ten-year period; the
    /// perturbed albedo is modulated by 1% on a `2 pi`-year period.
    pub fn generate(constants: &ClimateConstants, steps: usize) -> Self {
        let years: Vec<f64> = (0..=steps).map(|k| START_YEAR + k as f64).collect();

        let ramp = (410.0 - 315.0) / 60.0 * 0.05 / 280.0;
        let emissivity_nominal: Vec<f64> = (1..=steps)
            .map(|k| constants.emissivity + ramp * k as f64)
            .collect();

        let mut emissivity = Vec::with_capacity(steps);
        if let Some(&first) = emissivity_nominal.first() {
            emissivity.push(first);
        }
        for k in 1..steps {
            let growth = emissivity_nominal[k] - emissivity_nominal[k - 1];
            emissivity.push(emissivity[k - 1] - 0.5 * growth);
        }
        for (u, y) in emissivity.iter_mut().zip(&years) {
            *u *= 1.0 + 0.01 * (2.0 * PI * y / 10.0).sin();
        }

        let albedo_nominal = vec![constants.albedo; steps];
        let albedo: Vec<f64> = years[..steps]
            .iter()
            .map(|y| constants.albedo * (1.0 + 0.01 * y.sin()))
            .collect();

        let forcing_nominal = albedo_nominal
            .iter()
            .map(|&a| constants.solar_forcing(a))
            .collect();
        let forcing = albedo.iter().map(|&a| constants.solar_forcing(a)).collect();

        Self {
            years,
            emissivity_nominal,
            emissivity,
            albedo_nominal,
            albedo,
            forcing_nominal,
            forcing,
            initial_kelvin: constants.equilibrium_temperature(constants.emissivity),
        }
    }

    /// Emissivity perturbation scaled by `scale`.
    pub fn emissivity_delta(&self, scale: f64) -> Vec<f64> {
        self.emissivity
            .iter()
            .zip(&self.emissivity_nominal)
            .map(|(u, u_hat)| scale * (u - u_hat))
            .collect()
    }

    /// Forcing perturbation scaled by `scale`.
    pub fn forcing_delta(&self, scale: f64) -> Vec<f64> {
        self.forcing
            .iter()
            .zip(&self.forcing_nominal)
            .map(|(w, w_hat)| scale * (w - w_hat))
            .collect()
    }
}
