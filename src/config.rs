//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::devices::climate::ClimateConstants;
use crate::inputs::SyntheticWeather;
use crate::sim::ode::Tolerances;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Seed and experiment selection.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// 2R2C house with a heat pump.
    #[serde(default)]
    pub building: BuildingConfig,
    /// Electric vehicle battery and driving.
    #[serde(default)]
    pub ev: EvConfig,
    /// Domestic hot water tank.
    #[serde(default)]
    pub water_heater: WaterHeaterConfig,
    /// Yearly planetary energy balance.
    #[serde(default)]
    pub climate: ClimateConfig,
}

/// Which experiment(s) a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Experiment {
    Building,
    Ev,
    WaterHeater,
    Climate,
    #[default]
    All,
}

impl Experiment {
    /// Accepted names, in CLI spelling.
    pub const NAMES: &[&str] = &["building", "ev", "water-heater", "climate", "all"];

    /// Whether this selection includes `other`.
    pub fn includes(self, other: Experiment) -> bool {
        self == Experiment::All || self == other
    }
}

impl FromStr for Experiment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "building" => Ok(Self::Building),
            "ev" => Ok(Self::Ev),
            "water-heater" => Ok(Self::WaterHeater),
            "climate" => Ok(Self::Climate),
            "all" => Ok(Self::All),
            _ => Err(ConfigError::new(
                "simulation.experiment",
                format!("unknown experiment \"{s}\", available: {}", Self::NAMES.join(", ")),
            )),
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::Ev => "ev",
            Self::WaterHeater => "water-heater",
            Self::Climate => "climate",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Global run parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    pub experiment: Experiment,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            experiment: Experiment::All,
        }
    }
}

/// 2R2C building parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildingConfig {
    /// Conditioned floor area (m²).
    pub floor_area_m2: f64,
    pub stories: u32,
    /// Step duration (h); must divide a day.
    pub dt_hours: f64,
    pub days: usize,
    /// Heat pump thermal capacity (kW).
    pub heater_max_kw: f64,
    pub day_setpoint_c: f64,
    pub night_setpoint_c: f64,
    /// Thermostat deadband half-width (°C).
    pub deadband_c: f64,
    /// Measured weather with `hour`, `outdoor_c` and `irradiance_kw_m2`
    /// columns. Synthetic weather is used when absent.
    pub weather_csv: Option<PathBuf>,
    pub mean_outdoor_c: f64,
    pub outdoor_swing_c: f64,
    pub peak_irradiance_kw_m2: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        let weather = SyntheticWeather::default();
        Self {
            floor_area_m2: 200.0,
            stories: 2,
            dt_hours: 0.25,
            days: 5,
            heater_max_kw: 14.0,
            day_setpoint_c: 21.0,
            night_setpoint_c: 18.5,
            deadband_c: 0.5,
            weather_csv: None,
            mean_outdoor_c: weather.mean_outdoor_c,
            outdoor_swing_c: weather.outdoor_swing_c,
            peak_irradiance_kw_m2: weather.peak_irradiance_kw_m2,
        }
    }
}

impl BuildingConfig {
    /// Synthetic weather generator with the configured overrides.
    pub fn synthetic_weather(&self) -> SyntheticWeather {
        SyntheticWeather {
            mean_outdoor_c: self.mean_outdoor_c,
            outdoor_swing_c: self.outdoor_swing_c,
            peak_irradiance_kw_m2: self.peak_irradiance_kw_m2,
            ..SyntheticWeather::default()
        }
    }
}

/// Electric vehicle parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvConfig {
    /// Step duration (h); must divide a day.
    pub dt_hours: f64,
    pub days: usize,
    /// Self-dissipation time constant (h).
    pub tau_hours: f64,
    /// Charging efficiency (0, 1].
    pub eta_c: f64,
    /// Discharging efficiency (0, 1].
    pub eta_d: f64,
    /// Charging capacity (kW).
    pub max_charge_kw: f64,
    /// Discharging capacity (kW).
    pub max_discharge_kw: f64,
    /// Chemical energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Minimum acceptable energy (kWh).
    pub min_kwh: f64,
    /// Energy at the start of the run (kWh).
    pub initial_kwh: f64,
    /// Driving energy intensity (kWh/km).
    pub intensity_kwh_per_km: f64,
    /// Hour of day by which the deadline policy reaches its target.
    pub deadline_hour: f64,
    /// Deadline policy target (kWh).
    pub target_kwh: f64,
}

impl Default for EvConfig {
    fn default() -> Self {
        Self {
            dt_hours: 1.0 / 60.0,
            days: 7,
            tau_hours: 1600.0,
            eta_c: 0.95,
            eta_d: 0.95,
            max_charge_kw: 11.5,
            max_discharge_kw: 0.0,
            capacity_kwh: 80.0,
            min_kwh: 40.0,
            initial_kwh: 80.0,
            intensity_kwh_per_km: 0.3,
            deadline_hour: 6.0,
            target_kwh: 80.0,
        }
    }
}

/// Water heater parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaterHeaterConfig {
    /// Tank volume (m³).
    pub volume_m3: f64,
    /// Wall thermal transmittance (kW/m²/°C).
    pub transmittance: f64,
    /// Step duration (h).
    pub dt_hours: f64,
    pub days: usize,
    pub occupants: usize,
    pub hot_c: f64,
    pub inlet_c: f64,
    pub ambient_c: f64,
    /// Resistor capacity (kW).
    pub resistor_max_kw: f64,
    /// Heat pump electrical capacity (kW).
    pub heat_pump_max_kw: f64,
    /// Heat pump coefficient of performance.
    pub cop: f64,
    /// Hybrid resistor threshold as a fraction of tank capacity.
    pub resistor_threshold_fraction: f64,
}

impl Default for WaterHeaterConfig {
    fn default() -> Self {
        Self {
            volume_m3: 0.19,
            transmittance: 0.0005,
            dt_hours: 5.0 / 60.0,
            days: 5,
            occupants: 4,
            hot_c: 52.0,
            inlet_c: 15.0,
            ambient_c: 20.0,
            resistor_max_kw: 4.5,
            heat_pump_max_kw: 0.5,
            cop: 3.0,
            resistor_threshold_fraction: 0.5,
        }
    }
}

/// Climate model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClimateConfig {
    /// Number of yearly steps.
    pub steps: usize,
    pub albedo: f64,
    /// Solar constant (W/m²).
    pub solar_constant: f64,
    /// Baseline atmospheric emissivity.
    pub emissivity: f64,
    /// Depth of the well-mixed ocean layer (m).
    pub mixed_layer_depth_m: f64,
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// Integrator step budget per simulation step.
    pub max_solver_steps: usize,
    /// Perturbation scales at which the linearization is compared.
    pub perturbation_scales: Vec<f64>,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        let constants = ClimateConstants::default();
        let tol = Tolerances::default();
        Self {
            steps: 78,
            albedo: constants.albedo,
            solar_constant: constants.solar_constant,
            emissivity: constants.emissivity,
            mixed_layer_depth_m: constants.mixed_layer_depth,
            abs_tol: tol.abs,
            rel_tol: tol.rel,
            max_solver_steps: 100_000,
            perturbation_scales: vec![1.0, 0.1],
        }
    }
}

impl ClimateConfig {
    pub fn constants(&self) -> ClimateConstants {
        ClimateConstants {
            albedo: self.albedo,
            solar_constant: self.solar_constant,
            emissivity: self.emissivity,
            mixed_layer_depth: self.mixed_layer_depth_m,
            ..ClimateConstants::default()
        }
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.abs_tol,
            rel: self.rel_tol,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"building.dt_hours"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects violations while walking the config.
struct Checker(Vec<ConfigError>);

impl Checker {
    fn require(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(ConfigError::new(field, message));
        }
    }

    fn positive(&mut self, value: f64, field: &str) {
        self.require(value.is_finite() && value > 0.0, field, "must be > 0");
    }

    fn non_negative(&mut self, value: f64, field: &str) {
        self.require(value.is_finite() && value >= 0.0, field, "must be >= 0");
    }

    fn unit_interval(&mut self, value: f64, field: &str) {
        self.require((0.0..=1.0).contains(&value), field, "must be in [0.0, 1.0]");
    }

    fn divides_day(&mut self, dt_hours: f64, field: &str) {
        if !(dt_hours.is_finite() && dt_hours > 0.0) {
            self.require(false, field, "must be > 0");
            return;
        }
        let per_day = 24.0 / dt_hours;
        self.require(
            (per_day - per_day.round()).abs() < 1e-6,
            field,
            "must divide 24 h into a whole number of steps",
        );
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the cold-snap preset: a colder week that saturates the heat
    /// pump, and a commuter with longer trips and a tighter deadline.
    pub fn cold_snap() -> Self {
        Self {
            building: BuildingConfig {
                days: 3,
                mean_outdoor_c: -18.0,
                outdoor_swing_c: 5.0,
                peak_irradiance_kw_m2: 0.2,
                ..BuildingConfig::default()
            },
            ev: EvConfig {
                days: 3,
                intensity_kwh_per_km: 0.4,
                deadline_hour: 5.0,
                initial_kwh: 60.0,
                ..EvConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the small-tank preset: a 100 l tank shared by five occupants.
    pub fn small_tank() -> Self {
        Self {
            water_heater: WaterHeaterConfig {
                volume_m3: 0.1,
                occupants: 5,
                days: 3,
                ..WaterHeaterConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "cold_snap", "small_tank"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cold_snap" => Ok(Self::cold_snap()),
            "small_tank" => Ok(Self::small_tank()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut c = Checker(Vec::new());

        let b = &self.building;
        c.positive(b.floor_area_m2, "building.floor_area_m2");
        c.require(b.stories > 0, "building.stories", "must be > 0");
        c.divides_day(b.dt_hours, "building.dt_hours");
        c.require(b.days > 0, "building.days", "must be > 0");
        c.non_negative(b.heater_max_kw, "building.heater_max_kw");
        c.non_negative(b.deadband_c, "building.deadband_c");
        c.non_negative(b.peak_irradiance_kw_m2, "building.peak_irradiance_kw_m2");

        let ev = &self.ev;
        c.divides_day(ev.dt_hours, "ev.dt_hours");
        c.require(ev.days > 0, "ev.days", "must be > 0");
        c.positive(ev.tau_hours, "ev.tau_hours");
        for (eta, field) in [(ev.eta_c, "ev.eta_c"), (ev.eta_d, "ev.eta_d")] {
            c.require(eta > 0.0 && eta <= 1.0, field, "must be in (0.0, 1.0]");
        }
        c.non_negative(ev.max_charge_kw, "ev.max_charge_kw");
        c.non_negative(ev.max_discharge_kw, "ev.max_discharge_kw");
        c.positive(ev.capacity_kwh, "ev.capacity_kwh");
        c.non_negative(ev.intensity_kwh_per_km, "ev.intensity_kwh_per_km");
        c.require(
            ev.min_kwh > 0.0 && ev.min_kwh <= ev.capacity_kwh,
            "ev.min_kwh",
            "must be in (0, ev.capacity_kwh]",
        );
        c.require(
            (0.0..=ev.capacity_kwh).contains(&ev.initial_kwh),
            "ev.initial_kwh",
            "must be in [0, ev.capacity_kwh]",
        );
        c.require(
            (ev.min_kwh..=ev.capacity_kwh).contains(&ev.target_kwh),
            "ev.target_kwh",
            "must be in [ev.min_kwh, ev.capacity_kwh]",
        );
        c.require(
            (0.0..24.0).contains(&ev.deadline_hour),
            "ev.deadline_hour",
            "must be in [0, 24)",
        );

        let wh = &self.water_heater;
        c.positive(wh.volume_m3, "water_heater.volume_m3");
        c.positive(wh.transmittance, "water_heater.transmittance");
        c.divides_day(wh.dt_hours, "water_heater.dt_hours");
        c.require(wh.days > 0, "water_heater.days", "must be > 0");
        c.require(
            wh.hot_c > wh.inlet_c,
            "water_heater.hot_c",
            "must be > water_heater.inlet_c",
        );
        c.non_negative(wh.resistor_max_kw, "water_heater.resistor_max_kw");
        c.non_negative(wh.heat_pump_max_kw, "water_heater.heat_pump_max_kw");
        c.positive(wh.cop, "water_heater.cop");
        c.unit_interval(
            wh.resistor_threshold_fraction,
            "water_heater.resistor_threshold_fraction",
        );

        let cl = &self.climate;
        c.require(cl.steps > 0, "climate.steps", "must be > 0");
        c.require((0.0..1.0).contains(&cl.albedo), "climate.albedo", "must be in [0.0, 1.0)");
        c.positive(cl.solar_constant, "climate.solar_constant");
        c.unit_interval(cl.emissivity, "climate.emissivity");
        c.positive(cl.mixed_layer_depth_m, "climate.mixed_layer_depth_m");
        c.positive(cl.abs_tol, "climate.abs_tol");
        c.positive(cl.rel_tol, "climate.rel_tol");
        c.require(cl.max_solver_steps > 0, "climate.max_solver_steps", "must be > 0");
        c.require(
            !cl.perturbation_scales.is_empty()
                && cl.perturbation_scales.iter().all(|s| s.is_finite() && *s > 0.0),
            "climate.perturbation_scales",
            "must be a non-empty list of positive values",
        );

        c.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
seed = 99
experiment = "water-heater"

[building]
floor_area_m2 = 150.0
stories = 1
dt_hours = 0.5
days = 2
weather_csv = "data/weather.csv"

[ev]
dt_hours = 0.25
days = 2
capacity_kwh = 60.0
min_kwh = 20.0
target_kwh = 50.0
initial_kwh = 30.0

[water_heater]
volume_m3 = 0.25
occupants = 2
cop = 2.5

[climate]
steps = 10
perturbation_scales = [1.0, 0.5, 0.25]
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(
            cfg.as_ref().map(|c| c.simulation.experiment),
            Some(Experiment::WaterHeater)
        );
        assert_eq!(cfg.as_ref().map(|c| c.building.stories), Some(1));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.building.weather_csv.clone()),
            Some(PathBuf::from("data/weather.csv"))
        );
        assert_eq!(cfg.as_ref().map(|c| c.climate.perturbation_scales.len()), Some(3));
        let errors = cfg.map(|c| c.validate()).unwrap_or_default();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[building]
days = 2
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_experiment_rejected() {
        let toml = "[simulation]\nexperiment = \"solar\"\n";
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
        assert!("solar".parse::<Experiment>().is_err());
    }

    #[test]
    fn experiment_names_round_trip() {
        for name in Experiment::NAMES {
            let parsed: Result<Experiment, _> = name.parse();
            assert_eq!(parsed.map(|e| e.to_string()).ok().as_deref(), Some(*name));
        }
        assert!(Experiment::All.includes(Experiment::Climate));
        assert!(!Experiment::Ev.includes(Experiment::Building));
    }

    #[test]
    fn validation_catches_uneven_timestep() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.building.dt_hours = 0.7;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "building.dt_hours"));
    }

    #[test]
    fn validation_catches_ev_energy_ordering() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.ev.min_kwh = 70.0;
        cfg.ev.target_kwh = 60.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "ev.target_kwh"));
    }

    #[test]
    fn validation_requires_positive_ev_minimum() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.ev.min_kwh = 0.0;
        cfg.ev.target_kwh = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "ev.min_kwh"));
    }

    #[test]
    fn validation_catches_water_heater_step_longer_than_a_day() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.water_heater.dt_hours = 50.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "water_heater.dt_hours"));
    }

    #[test]
    fn validation_catches_bad_efficiency_and_deadline() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.ev.eta_c = 1.2;
        cfg.ev.deadline_hour = 24.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "ev.eta_c"));
        assert!(errors.iter().any(|e| e.field == "ev.deadline_hour"));
    }

    #[test]
    fn validation_catches_cold_inlet_above_hot() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.water_heater.inlet_c = 60.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "water_heater.hot_c"));
    }

    #[test]
    fn validation_catches_empty_scales() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.climate.perturbation_scales.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "climate.perturbation_scales"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn cold_snap_is_colder() {
        let base = ScenarioConfig::baseline();
        let cold = ScenarioConfig::cold_snap();
        assert!(cold.building.mean_outdoor_c < base.building.mean_outdoor_c);
        assert!(cold.ev.intensity_kwh_per_km > base.ev.intensity_kwh_per_km);
    }

    #[test]
    fn small_tank_has_less_volume() {
        let small = ScenarioConfig::small_tank();
        assert!(small.water_heater.volume_m3 < ScenarioConfig::baseline().water_heater.volume_m3);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.experiment), Some(Experiment::All));
        assert_eq!(cfg.as_ref().map(|c| c.building.heater_max_kw), Some(14.0));
        assert_eq!(cfg.as_ref().map(|c| c.climate.steps), Some(78));
    }

    #[test]
    fn climate_constants_follow_config() {
        let cfg = ClimateConfig {
            mixed_layer_depth_m: 35.0,
            ..ClimateConfig::default()
        };
        let c = cfg.constants();
        assert_eq!(c.mixed_layer_depth, 35.0);
        assert!((c.beta() - 2.0 * ClimateConstants::default().beta()).abs() < 1e-25);
    }
}
