//! Seeded generators for the exogenous inputs of each experiment.

/// Emissivity and albedo scenarios for the climate model.
pub mod climate;
/// Trips and plug-in availability for the EV.
pub mod driving;
/// Shower draws on a domestic hot water tank.
pub mod water_draws;
/// Synthetic outdoor conditions, internal gains and setpoints.
pub mod weather;

pub use climate::ClimateInputs;
pub use driving::{driving_power, plugged_in};
pub use water_draws::water_draws;
pub use weather::{SyntheticWeather, WeatherSeries, exogenous_heat_kw, setpoint_schedule};
