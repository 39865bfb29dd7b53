//! Builds each experiment from a scenario and runs every policy on it.
//!
//! All policies of one experiment share the same seeded disturbance
//! trajectory, so their KPIs are directly comparable.

use nalgebra::Vector2;
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::info;

use crate::config::{
    BuildingConfig, ClimateConfig, EvConfig, Experiment, ScenarioConfig, WaterHeaterConfig,
};
use crate::controllers::{
    ChargeBelowMinimum, ChargeWhenPlugged, Controller, DeadlineCharging, OpenLoop,
    PerfectTracking, Thermostat, WaterHeaterDispatch,
};
use crate::devices::climate::{SECONDS_PER_YEAR, k2c};
use crate::devices::types::Plant;
use crate::devices::{Building2R2C, ClimateModel, EvBattery, WaterHeater};
use crate::error::SimError;
use crate::inputs::{
    ClimateInputs, driving_power, exogenous_heat_kw, plugged_in, setpoint_schedule, water_draws,
};
use crate::io::export::Column;
use crate::io::import::{ImportError, load_series};
use crate::sim::engine::Engine;
use crate::sim::kpi::KpiReport;
use crate::sim::types::{CapacityBounds, SimConfig, Trajectory};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("weather import: {0}")]
    Import(#[from] ImportError),
}

/// One policy's run within an experiment.
#[derive(Debug, Clone)]
pub struct PolicyRun<S> {
    pub kpis: KpiReport,
    pub trajectory: Trajectory<S>,
    /// Named side series exported next to the trajectory.
    pub series: Vec<(&'static str, Vec<f64>)>,
}

impl<S> PolicyRun<S> {
    pub fn columns(&self) -> Vec<Column<'_>> {
        self.series
            .iter()
            .map(|(name, values)| Column {
                name,
                values: values.as_slice(),
            })
            .collect()
    }
}

/// A perturbed climate run and its linearized prediction.
#[derive(Debug, Clone)]
pub struct Perturbation {
    pub scale: f64,
    pub run: PolicyRun<f64>,
    /// Linearized temperatures (K+1, K).
    pub linearized: Vec<f64>,
    /// Largest `|x - x_lin|` over the horizon (K).
    pub max_abs_error: f64,
}

#[derive(Debug, Clone)]
pub struct ClimateRun {
    pub nominal: PolicyRun<f64>,
    pub perturbations: Vec<Perturbation>,
}

/// Results of every experiment a scenario selected.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub building: Vec<PolicyRun<Vector2<f64>>>,
    pub ev: Vec<PolicyRun<f64>>,
    pub water_heater: Vec<PolicyRun<f64>>,
    pub climate: Option<ClimateRun>,
}

impl RunSummary {
    /// KPI reports in run order.
    pub fn kpis(&self) -> Vec<&KpiReport> {
        let climate = self.climate.iter().flat_map(|c| {
            std::iter::once(&c.nominal.kpis).chain(c.perturbations.iter().map(|p| &p.run.kpis))
        });
        self.building
            .iter()
            .map(|r| &r.kpis)
            .chain(self.ev.iter().map(|r| &r.kpis))
            .chain(self.water_heater.iter().map(|r| &r.kpis))
            .chain(climate)
            .collect()
    }
}

/// Runs the experiments selected by `config.simulation.experiment`.
///
/// # Errors
///
/// Returns the first precondition, import or integration failure.
pub fn run_scenario(config: &ScenarioConfig) -> Result<RunSummary, RunError> {
    let seed = config.simulation.seed;
    let selected = config.simulation.experiment;
    let mut summary = RunSummary::default();

    if selected.includes(Experiment::Building) {
        summary.building = run_building(&config.building, seed)?;
    }
    if selected.includes(Experiment::Ev) {
        summary.ev = run_ev(&config.ev, seed)?;
    }
    if selected.includes(Experiment::WaterHeater) {
        summary.water_heater = run_water_heater(&config.water_heater, seed)?;
    }
    if selected.includes(Experiment::Climate) {
        summary.climate = Some(run_climate(&config.climate, seed)?);
    }
    Ok(summary)
}

fn simulate<P, C>(
    sim: &SimConfig,
    plant: P,
    controller: C,
    disturbance: &[f64],
    bounds: &CapacityBounds,
    initial: P::State,
) -> Result<Trajectory<P::State>, SimError>
where
    P: Plant,
    C: Controller<P::State>,
{
    let name = controller.name();
    let trajectory = Engine::new(
        sim.clone(),
        plant,
        controller,
        disturbance.to_vec(),
        bounds.clone(),
    )?
    .run(initial)?;
    info!(
        policy = name,
        steps = trajectory.steps(),
        saturated = trajectory.saturated_steps(),
        "policy run complete"
    );
    Ok(trajectory)
}

/// Building heated by a heat pump under perfect tracking and a thermostat.
///
/// # Errors
///
/// Fails on invalid parameters or an unreadable weather file.
pub fn run_building(
    cfg: &BuildingConfig,
    seed: u64,
) -> Result<Vec<PolicyRun<Vector2<f64>>>, RunError> {
    let sim = SimConfig::new(cfg.dt_hours, seed)?;
    let steps = sim.steps_for_days(cfg.days);
    let times = sim.time_grid(steps);
    let step_times = &times[..steps];
    let mut rng = StdRng::seed_from_u64(seed);

    let mut weather = cfg.synthetic_weather().generate(step_times, &mut rng);
    if let Some(path) = &cfg.weather_csv {
        info!(path = %path.display(), "loading measured weather");
        weather.outdoor_c = load_series(path, "outdoor_c", step_times)?;
        weather.irradiance_kw_m2 = load_series(path, "irradiance_kw_m2", step_times)?;
    }
    let qe = exogenous_heat_kw(
        &weather.plug_kw,
        &weather.irradiance_kw_m2,
        cfg.floor_area_m2,
        cfg.stories,
        &mut rng,
    );

    let building = Building2R2C::from_floor_area(cfg.floor_area_m2, cfg.stories, cfg.dt_hours)?;
    let w: Vec<f64> = qe
        .iter()
        .zip(&weather.outdoor_c)
        .map(|(&q, &t)| building.disturbance_kw(q, t))
        .collect();
    let setpoint = setpoint_schedule(&times, cfg.day_setpoint_c, cfg.night_setpoint_c);
    let bounds = CapacityBounds::constant(0.0, cfg.heater_max_kw, steps);
    let mean_setpoint = setpoint.iter().sum::<f64>() / setpoint.len() as f64;
    let initial = Vector2::new(setpoint[0], mean_setpoint);

    let tracking = PerfectTracking::for_building(&building, setpoint.clone())?;
    let thermostat = Thermostat::new(setpoint.clone(), cfg.deadband_c)?;
    let runs = [
        (
            Controller::<Vector2<f64>>::name(&tracking),
            simulate(&sim, building.clone(), tracking, &w, &bounds, initial)?,
        ),
        (
            Controller::<Vector2<f64>>::name(&thermostat),
            simulate(&sim, building, thermostat, &w, &bounds, initial)?,
        ),
    ];

    Ok(runs
        .into_iter()
        .map(|(name, trajectory)| PolicyRun {
            kpis: KpiReport::from_trajectory(
                &format!("building/{name}"),
                &trajectory,
                Some(setpoint.as_slice()),
                &trajectory.actions,
                cfg.dt_hours,
            ),
            trajectory,
            series: vec![
                ("setpoint_c", setpoint.clone()),
                ("outdoor_c", weather.outdoor_c.clone()),
            ],
        })
        .collect())
}

/// EV charged by the three charging policies over the same driving pattern.
///
/// # Errors
///
/// Fails on invalid parameters.
pub fn run_ev(cfg: &EvConfig, seed: u64) -> Result<Vec<PolicyRun<f64>>, RunError> {
    let sim = SimConfig::new(cfg.dt_hours, seed)?;
    let steps = sim.steps_for_days(cfg.days);
    let times = sim.time_grid(steps);
    let mut rng = StdRng::seed_from_u64(seed);

    let drive = driving_power(&sim, cfg.days, cfg.intensity_kwh_per_km, &mut rng);
    let plugged = plugged_in(&times[..steps], &drive);
    let w: Vec<f64> = drive.iter().map(|p| -p).collect();
    let bounds = CapacityBounds::gated(cfg.max_charge_kw, &plugged);

    let battery = EvBattery::new(
        cfg.tau_hours,
        cfg.eta_c,
        cfg.eta_d,
        cfg.max_charge_kw,
        cfg.max_discharge_kw,
        cfg.capacity_kwh,
        cfg.dt_hours,
    )?;

    let policy1 = ChargeWhenPlugged::new(battery.clone());
    let policy2 = ChargeBelowMinimum::new(battery.clone(), cfg.min_kwh)?;
    let policy3 = DeadlineCharging::new(
        battery.clone(),
        cfg.min_kwh,
        cfg.target_kwh,
        cfg.deadline_hour,
        cfg.dt_hours,
    )?;
    let runs = [
        (
            Controller::<f64>::name(&policy1),
            simulate(&sim, battery.clone(), policy1, &w, &bounds, cfg.initial_kwh)?,
        ),
        (
            Controller::<f64>::name(&policy2),
            simulate(&sim, battery.clone(), policy2, &w, &bounds, cfg.initial_kwh)?,
        ),
        (
            Controller::<f64>::name(&policy3),
            simulate(&sim, battery, policy3, &w, &bounds, cfg.initial_kwh)?,
        ),
    ];

    Ok(runs
        .into_iter()
        .map(|(name, trajectory)| PolicyRun {
            kpis: KpiReport::from_trajectory(
                &format!("ev/{name}"),
                &trajectory,
                None,
                &trajectory.actions,
                cfg.dt_hours,
            ),
            trajectory,
            series: vec![("plugged_in", plugged.clone()), ("driving_kw", drive.clone())],
        })
        .collect())
}

/// Water heater under resistance, heat pump and hybrid dispatch.
///
/// # Errors
///
/// Fails on invalid parameters.
pub fn run_water_heater(cfg: &WaterHeaterConfig, seed: u64) -> Result<Vec<PolicyRun<f64>>, RunError> {
    let sim = SimConfig::new(cfg.dt_hours, seed)?;
    let steps = sim.steps_for_days(cfg.days);
    let times = sim.time_grid(steps);
    let mut rng = StdRng::seed_from_u64(seed);

    let draws = water_draws(&times, cfg.occupants, &mut rng);
    let tank = WaterHeater::from_geometry(
        cfg.volume_m3,
        cfg.transmittance,
        cfg.hot_c,
        cfg.inlet_c,
        cfg.ambient_c,
        cfg.dt_hours,
    )?;
    let w: Vec<f64> = draws.iter().map(|&q| tank.disturbance_kw(q)).collect();
    let cop = vec![cfg.cop; steps];
    let capacity = tank.capacity_kwh();

    let dispatchers = [
        WaterHeaterDispatch::resistance_only(tank.clone(), cfg.resistor_max_kw, cop.clone())?,
        WaterHeaterDispatch::heat_pump_only(tank.clone(), cfg.heat_pump_max_kw, cop.clone())?,
        WaterHeaterDispatch::hybrid(
            tank.clone(),
            cfg.heat_pump_max_kw,
            cfg.resistor_max_kw,
            cfg.resistor_threshold_fraction * capacity,
            cop,
        )?,
    ];

    let mut runs = Vec::with_capacity(dispatchers.len());
    for dispatch in dispatchers {
        let max: Vec<f64> = (0..steps).map(|k| dispatch.max_thermal_kw(k)).collect();
        let bounds = CapacityBounds::per_step(vec![0.0; steps], max)?;
        let label = dispatch.kind().label();
        let electrical_model = dispatch.clone();
        let trajectory = simulate(&sim, tank.clone(), dispatch, &w, &bounds, capacity)?;
        let electrical = electrical_model.electrical_series(&trajectory.actions);
        runs.push(PolicyRun {
            kpis: KpiReport::from_trajectory(
                &format!("water-heater/{label}"),
                &trajectory,
                None,
                &electrical,
                cfg.dt_hours,
            ),
            trajectory,
            series: vec![("draw_kw", draws.clone()), ("electrical_kw", electrical)],
        });
    }
    Ok(runs)
}

/// Nominal and perturbed climate runs with the linearized comparison.
///
/// Each perturbation scales the emissivity and forcing deviations from the
/// nominal scenario; the linearization error should shrink faster than the
/// scale.
///
/// # Errors
///
/// Fails on invalid parameters or an integrator failure.
pub fn run_climate(cfg: &ClimateConfig, seed: u64) -> Result<ClimateRun, RunError> {
    let constants = cfg.constants();
    let inputs = ClimateInputs::generate(&constants, cfg.steps);
    let model = ClimateModel::new(constants.beta(), SECONDS_PER_YEAR)?
        .with_solver(cfg.tolerances(), cfg.max_solver_steps);
    let sim = SimConfig::new(SECONDS_PER_YEAR / 3600.0, seed)?;
    let bounds = CapacityBounds::constant(0.0, 1.0, cfg.steps);
    let x0 = inputs.initial_kelvin;

    let nominal = simulate(
        &sim,
        model.clone(),
        OpenLoop::new(inputs.emissivity_nominal.clone()),
        &inputs.forcing_nominal,
        &bounds,
        x0,
    )?;
    let celsius = |states: &[f64]| states.iter().map(|&x| k2c(x)).collect::<Vec<_>>();

    let mut perturbations = Vec::with_capacity(cfg.perturbation_scales.len());
    for &scale in &cfg.perturbation_scales {
        let du = inputs.emissivity_delta(scale);
        let dwt = inputs.forcing_delta(scale);
        let u: Vec<f64> = inputs.emissivity_nominal.iter().zip(&du).map(|(a, b)| a + b).collect();
        let wt: Vec<f64> = inputs.forcing_nominal.iter().zip(&dwt).map(|(a, b)| a + b).collect();

        let trajectory = simulate(&sim, model.clone(), OpenLoop::new(u), &wt, &bounds, x0)?;
        let linearized =
            model.linearized_trajectory(&nominal.states, &inputs.emissivity_nominal, &du, &dwt)?;
        let max_abs_error = trajectory
            .states
            .iter()
            .zip(&linearized)
            .map(|(x, l)| (x - l).abs())
            .fold(0.0_f64, f64::max);
        info!(scale, max_abs_error, "linearization compared");

        perturbations.push(Perturbation {
            scale,
            run: PolicyRun {
                kpis: KpiReport::from_trajectory(
                    &format!("climate/perturbed x{scale}"),
                    &trajectory,
                    Some(linearized.as_slice()),
                    &[],
                    sim.dt_hours,
                ),
                series: vec![
                    ("year", inputs.years.clone()),
                    ("temperature_c", celsius(&trajectory.states)),
                    ("linearized_k", linearized.clone()),
                ],
                trajectory,
            },
            linearized,
            max_abs_error,
        });
    }

    let nominal = PolicyRun {
        kpis: KpiReport::from_trajectory("climate/nominal", &nominal, None, &[], sim.dt_hours),
        series: vec![
            ("year", inputs.years.clone()),
            ("temperature_c", celsius(&nominal.states)),
        ],
        trajectory: nominal,
    };
    Ok(ClimateRun {
        nominal,
        perturbations,
    })
}
