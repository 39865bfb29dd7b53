//! Water heater dispatch for resistance, heat pump and hybrid equipment.

mod common;

use rand::{SeedableRng, rngs::StdRng};

use energy_control_sim::controllers::{HeaterKind, WaterHeaterDispatch};
use energy_control_sim::inputs::water_draws;
use energy_control_sim::runner::run_water_heater;
use energy_control_sim::sim::engine::Engine;
use energy_control_sim::sim::types::{CapacityBounds, Trajectory};

const DT: f64 = 5.0 / 60.0;

fn run(dispatch: WaterHeaterDispatch, draws: &[f64]) -> Trajectory<f64> {
    let tank = common::default_tank();
    let steps = draws.len();
    let w = draws.iter().map(|&q| tank.disturbance_kw(q)).collect();
    let max = (0..steps).map(|k| dispatch.max_thermal_kw(k)).collect();
    let bounds = CapacityBounds::per_step(vec![0.0; steps], max).unwrap();
    Engine::new(common::config(DT), tank.clone(), dispatch, w, bounds)
        .unwrap()
        .run(tank.capacity_kwh())
        .unwrap()
}

fn draws(seed: u64) -> Vec<f64> {
    let times = common::config(DT).time_grid(2 * 288);
    water_draws(&times, 4, &mut StdRng::seed_from_u64(seed))
}

#[test]
fn all_configurations_stay_within_capacity() {
    let tank = common::default_tank();
    let capacity = tank.capacity_kwh();
    let q = draws(21);
    let cop = vec![3.0; q.len()];
    let configs = [
        WaterHeaterDispatch::resistance_only(tank.clone(), 4.5, cop.clone()).unwrap(),
        WaterHeaterDispatch::heat_pump_only(tank.clone(), 0.5, cop.clone()).unwrap(),
        WaterHeaterDispatch::hybrid(tank, 0.5, 4.5, 0.5 * capacity, cop).unwrap(),
    ];

    for dispatch in configs {
        let kind = dispatch.kind();
        let bound: Vec<f64> = (0..q.len()).map(|k| dispatch.max_thermal_kw(k)).collect();
        let traj = run(dispatch, &q);
        for (k, &u) in traj.actions.iter().enumerate() {
            assert!(common::within(u, 0.0, bound[k]), "{kind:?} step {k}: {u}");
        }
        assert!(
            traj.states.iter().all(|&x| x <= capacity * (1.0 + 1e-9)),
            "{kind:?} overfilled"
        );
    }
}

#[test]
fn hybrid_resistor_runs_only_below_threshold() {
    let tank = common::default_tank();
    let threshold = 0.5 * tank.capacity_kwh();
    let q = draws(8);
    let dispatch =
        WaterHeaterDispatch::hybrid(tank, 0.5, 4.5, threshold, vec![3.0; q.len()]).unwrap();
    assert_eq!(dispatch.kind(), HeaterKind::Hybrid);
    let traj = run(dispatch.clone(), &q);

    for k in 0..q.len() {
        let (heat_pump, resistor) = dispatch.split_thermal_kw(traj.actions[k], k);
        if resistor > 1e-12 {
            assert!(traj.states[k] < threshold, "resistor on at step {k}");
            assert!((heat_pump - 1.5).abs() < 1e-12, "heat pump must be maxed first");
        }
    }
}

#[test]
fn heat_pump_draws_a_third_of_its_heat() {
    let tank = common::default_tank();
    let q = draws(3);
    let dispatch = WaterHeaterDispatch::heat_pump_only(tank, 0.5, vec![3.0; q.len()]).unwrap();
    let traj = run(dispatch.clone(), &q);
    let electrical = dispatch.electrical_series(&traj.actions);
    for (p, u) in electrical.iter().zip(&traj.actions) {
        assert!((p - u / 3.0).abs() < 1e-12);
        assert!(*p <= 0.5 + 1e-12);
    }
}

#[test]
fn reruns_with_one_seed_are_bit_identical() {
    let cfg = common::short_scenario(9).water_heater;
    let a = run_water_heater(&cfg, 9).unwrap();
    let b = run_water_heater(&cfg, 9).unwrap();
    common::assert_identical_runs(&a, &b);
}
