//! Plant models advanced one step at a time by the engine.

/// Electric vehicle battery.
pub mod battery;
/// Two-resistor two-capacitor building envelope.
pub mod building;
/// Single-state planetary energy balance.
pub mod climate;
pub mod types;
/// Domestic hot water tank.
pub mod water_heater;

pub use battery::EvBattery;
pub use building::Building2R2C;
pub use climate::ClimateModel;
pub use types::{Plant, PlantState};
pub use water_heater::WaterHeater;
