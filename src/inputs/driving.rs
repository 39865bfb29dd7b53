use rand::{Rng, rngs::StdRng};

use crate::devices::types::gaussian_noise;
use crate::sim::types::SimConfig;

/// Trips taken each day.
const TRIPS_PER_DAY: usize = 3;

/// Trip start window, hours of day.
const EARLIEST_START_HOUR: f64 = 6.0;
const START_WINDOW_HOURS: f64 = 14.0;

/// Log-normal trip distance parameters (of the underlying normal, ln km).
const DISTANCE_MU: f64 = 1.8;
const DISTANCE_SIGMA: f64 = 1.24;
const MAX_DISTANCE_KM: f64 = 100.0;

/// Trips shorter than this are driven at city speed.
const SHORT_TRIP_KM: f64 = 15.0;
const CITY_SPEED_KMH: f64 = 40.0;
const HIGHWAY_SPEED_KMH: f64 = 90.0;

/// Attempts to find an idle start slot before accepting an overlap.
const MAX_START_ATTEMPTS: usize = 1000;

/// Draws a trip distance in km from the capped log-normal.
pub fn trip_distance_km(rng: &mut StdRng) -> f64 {
    (DISTANCE_MU + DISTANCE_SIGMA * gaussian_noise(rng, 1.0))
        .exp()
        .min(MAX_DISTANCE_KM)
}

/// Cruising speed for a trip of the given length.
pub fn trip_speed_kmh(distance_km: f64) -> f64 {
    if distance_km < SHORT_TRIP_KM {
        CITY_SPEED_KMH
    } else {
        HIGHWAY_SPEED_KMH
    }
}

/// Generates the chemical power drawn to drive an EV (kW, K = days × steps/day).
///
/// Three trips a day start uniformly between 06:00 and 20:00, never on a
/// step that already carries driving. Each trip's energy
/// `intensity * distance` is spread over the steps it spans; trips are
/// truncated at midnight.
///
/// # Arguments
///
/// * `config` - Step duration; the series starts at midnight of day 0
/// * `days` - Number of whole days
/// * `intensity_kwh_per_km` - Energy intensity of driving
/// * `rng` - Seeded random number generator
pub fn driving_power(
    config: &SimConfig,
    days: usize,
    intensity_kwh_per_km: f64,
    rng: &mut StdRng,
) -> Vec<f64> {
    let dt = config.dt_hours;
    let steps_per_day = config.steps_per_day();
    let mut power = vec![0.0; steps_per_day * days];
    if steps_per_day == 0 {
        return power;
    }

    for day in 0..days {
        let offset = day * steps_per_day;
        for _ in 0..TRIPS_PER_DAY {
            let mut k_start = 0;
            for _ in 0..MAX_START_ATTEMPTS {
                let start_hour = EARLIEST_START_HOUR + START_WINDOW_HOURS * rng.random::<f64>();
                k_start = ((start_hour / dt).floor() as usize).min(steps_per_day - 1);
                if power[offset + k_start] == 0.0 {
                    break;
                }
            }

            let distance = trip_distance_km(rng);
            let speed = trip_speed_kmh(distance);
            let mut remaining_hours = distance / speed;
            let mut k = k_start;
            while remaining_hours > 0.0 && k < steps_per_day {
                let driven = dt.min(remaining_hours);
                power[offset + k] = intensity_kwh_per_km * speed * driven / dt;
                remaining_hours -= driven;
                k += 1;
            }
        }
    }
    power
}

/// Plug-in indicator: 1 overnight (before 06:00 or after 20:00) unless driving.
///
/// # Arguments
///
/// * `times_hr` - Start time of each step (K)
/// * `driving_kw` - Driving power per step (K)
pub fn plugged_in(times_hr: &[f64], driving_kw: &[f64]) -> Vec<f64> {
    times_hr
        .iter()
        .zip(driving_kw)
        .map(|(&t, &p)| {
            let hour = t.rem_euclid(24.0);
            if (hour < 6.0 || hour > 20.0) && p <= 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}
