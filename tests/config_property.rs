//! Any scenario that passes validation runs to completion.

mod common;

use proptest::prelude::*;

use energy_control_sim::config::{Experiment, ScenarioConfig};
use energy_control_sim::runner::{run_ev, run_scenario};

fn ev_minimum() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(80.0), 0.0_f64..80.0]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn validated_scenarios_run(
        seed in 0u64..10_000,
        min_kwh in ev_minimum(),
        target_share in 0.0_f64..=1.0,
        initial_kwh in 0.0_f64..=80.0,
        deadline_hour in 0.0_f64..24.0,
        max_charge_kw in 0.0_f64..20.0,
        heater_max_kw in 0.0_f64..20.0,
        deadband_c in 0.0_f64..2.0,
        threshold in 0.0_f64..=1.0,
        heat_pump_max_kw in 0.0_f64..2.0,
        resistor_max_kw in 0.0_f64..6.0,
    ) {
        let mut cfg: ScenarioConfig = common::short_scenario(seed);
        cfg.simulation.experiment = Experiment::All;
        cfg.ev.min_kwh = min_kwh;
        cfg.ev.target_kwh =
            (min_kwh + target_share * (cfg.ev.capacity_kwh - min_kwh)).min(cfg.ev.capacity_kwh);
        cfg.ev.initial_kwh = initial_kwh;
        cfg.ev.deadline_hour = deadline_hour;
        cfg.ev.max_charge_kw = max_charge_kw;
        cfg.building.heater_max_kw = heater_max_kw;
        cfg.building.deadband_c = deadband_c;
        cfg.water_heater.resistor_threshold_fraction = threshold;
        cfg.water_heater.heat_pump_max_kw = heat_pump_max_kw;
        cfg.water_heater.resistor_max_kw = resistor_max_kw;

        let errors = cfg.validate();
        if errors.is_empty() {
            let result = run_scenario(&cfg);
            prop_assert!(result.is_ok(), "validated scenario failed: {:?}", result.err());
        } else {
            prop_assert!(errors.iter().all(|e| e.field == "ev.min_kwh"), "{errors:?}");
        }
    }
}

#[test]
fn zero_ev_minimum_is_caught_before_running() {
    let mut cfg = common::short_scenario(1);
    cfg.ev.min_kwh = 0.0;
    cfg.ev.target_kwh = 0.0;
    assert!(cfg.validate().iter().any(|e| e.field == "ev.min_kwh"));
}

#[test]
fn smallest_positive_ev_minimum_runs() {
    let mut cfg = common::short_scenario(1);
    cfg.ev.min_kwh = 1e-6;
    assert!(cfg.validate().is_empty());
    assert_eq!(run_ev(&cfg.ev, 1).unwrap().len(), 3);
}
