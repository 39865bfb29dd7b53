use std::f64::consts::PI;

use rand::rngs::StdRng;

use crate::devices::types::gaussian_noise;

/// Outdoor conditions and plug loads sampled on the simulation grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSeries {
    /// Outdoor air temperature (°C).
    pub outdoor_c: Vec<f64>,
    /// Global horizontal irradiance (kW/m²).
    pub irradiance_kw_m2: Vec<f64>,
    /// Plugged-in appliance power (kW).
    pub plug_kw: Vec<f64>,
}

/// Daily-sinusoid weather and plug-load generator.
///
/// Used when no measured weather is supplied. Temperature follows a cosine
/// with its minimum at `coldest_hour`, irradiance a half-sine between
/// sunrise and sunset, and plug loads a base load with morning and evening
/// bumps. Every series carries Gaussian noise.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticWeather {
    pub mean_outdoor_c: f64,
    pub outdoor_swing_c: f64,
    pub coldest_hour: f64,
    pub outdoor_noise_c: f64,
    pub peak_irradiance_kw_m2: f64,
    pub sunrise_hour: f64,
    pub sunset_hour: f64,
    pub plug_base_kw: f64,
    pub plug_peak_kw: f64,
    pub plug_noise_kw: f64,
}

impl Default for SyntheticWeather {
    /// A late-December week in the US Midwest.
    fn default() -> Self {
        Self {
            mean_outdoor_c: -4.0,
            outdoor_swing_c: 4.0,
            coldest_hour: 6.0,
            outdoor_noise_c: 0.5,
            peak_irradiance_kw_m2: 0.35,
            sunrise_hour: 8.0,
            sunset_hour: 17.0,
            plug_base_kw: 0.3,
            plug_peak_kw: 0.6,
            plug_noise_kw: 0.05,
        }
    }
}

impl SyntheticWeather {
    /// Outdoor temperature without noise at a time of day.
    pub fn outdoor_mean_at(&self, hour: f64) -> f64 {
        self.mean_outdoor_c - self.outdoor_swing_c * (2.0 * PI * (hour - self.coldest_hour) / 24.0).cos()
    }

    /// Clear-sky irradiance at a time of day.
    pub fn irradiance_at(&self, hour: f64) -> f64 {
        if hour <= self.sunrise_hour || hour >= self.sunset_hour {
            return 0.0;
        }
        let frac = (hour - self.sunrise_hour) / (self.sunset_hour - self.sunrise_hour);
        self.peak_irradiance_kw_m2 * (PI * frac).sin()
    }

    /// Plug load without noise at a time of day.
    pub fn plug_mean_at(&self, hour: f64) -> f64 {
        let bump = |center: f64, width: f64| (-((hour - center) / width).powi(2)).exp();
        self.plug_base_kw + self.plug_peak_kw * bump(7.5, 1.5).max(bump(19.0, 2.5))
    }

    /// Samples all series at the given step start times.
    pub fn generate(&self, times_hr: &[f64], rng: &mut StdRng) -> WeatherSeries {
        let mut series = WeatherSeries {
            outdoor_c: Vec::with_capacity(times_hr.len()),
            irradiance_kw_m2: Vec::with_capacity(times_hr.len()),
            plug_kw: Vec::with_capacity(times_hr.len()),
        };
        for &t in times_hr {
            let hour = t.rem_euclid(24.0);
            series
                .outdoor_c
                .push(self.outdoor_mean_at(hour) + gaussian_noise(rng, self.outdoor_noise_c));
            let cloud = (1.0 + gaussian_noise(rng, 0.1)).max(0.0);
            series.irradiance_kw_m2.push(self.irradiance_at(hour) * cloud);
            series
                .plug_kw
                .push((self.plug_mean_at(hour) + gaussian_noise(rng, self.plug_noise_kw)).max(0.0));
        }
        series
    }
}

/// Solar aperture per unit irradiance `0.19 sqrt(N Af)` (m²).
pub fn solar_aperture_m2(floor_area_m2: f64, stories: u32) -> f64 {
    0.19 * (f64::from(stories) * floor_area_m2).sqrt()
}

/// Exogenous heat gains `qe = plug + aperture I + 1 + noise` (kW).
///
/// The constant 1 kW stands for occupants and everything else; the noise
/// has standard deviation 1/6 kW.
pub fn exogenous_heat_kw(
    plug_kw: &[f64],
    irradiance_kw_m2: &[f64],
    floor_area_m2: f64,
    stories: u32,
    rng: &mut StdRng,
) -> Vec<f64> {
    let aperture = solar_aperture_m2(floor_area_m2, stories);
    plug_kw
        .iter()
        .zip(irradiance_kw_m2)
        .map(|(&plug, &sun)| plug + aperture * sun + 1.0 + gaussian_noise(rng, 0.5 / 3.0))
        .collect()
}

/// Day/night heating setpoint on the given grid (°C).
///
/// `night_c` applies before 06:00 and after 22:00, `day_c` otherwise.
pub fn setpoint_schedule(times_hr: &[f64], day_c: f64, night_c: f64) -> Vec<f64> {
    times_hr
        .iter()
        .map(|&t| {
            let hour = t.rem_euclid(24.0);
            if hour < 6.0 || hour > 22.0 { night_c } else { day_c }
        })
        .collect()
}
