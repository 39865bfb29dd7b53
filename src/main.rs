//! Energy control simulator entry point: CLI wiring and report output.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use energy_control_sim::config::{Experiment, ScenarioConfig};
use energy_control_sim::devices::types::PlantState;
use energy_control_sim::io::export::export_csv;
use energy_control_sim::runner::{PolicyRun, RunSummary, run_scenario};

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    experiment: Option<Experiment>,
    telemetry_out: Option<String>,
    print_steps: bool,
}

fn print_help() {
    eprintln!("energy-control-sim: constrained state simulation of energy systems");
    eprintln!();
    eprintln!("Usage: energy-control-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!(
        "  --experiment <name>      Run one experiment ({})",
        Experiment::NAMES.join(", ")
    );
    eprintln!("  --telemetry-out <dir>    Export one CSV per policy run");
    eprintln!("  --steps                  Print every simulation step");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=info) for progress logs.");
}

fn fail(message: impl Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        experiment: None,
        telemetry_out: None,
        print_steps: false,
    };

    let mut i = 1;
    let value = |i: &mut usize, flag: &str, what: &str| -> String {
        *i += 1;
        match args.get(*i) {
            Some(v) => v.clone(),
            None => fail(format!("{flag} requires a {what} argument")),
        }
    };
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => cli.scenario_path = Some(value(&mut i, "--scenario", "path")),
            "--preset" => cli.preset = Some(value(&mut i, "--preset", "name")),
            "--seed" => {
                let raw = value(&mut i, "--seed", "u64");
                match raw.parse::<u64>() {
                    Ok(s) => cli.seed_override = Some(s),
                    Err(_) => fail(format!("--seed value \"{raw}\" is not a valid u64")),
                }
            }
            "--experiment" => {
                let raw = value(&mut i, "--experiment", "name");
                match raw.parse::<Experiment>() {
                    Ok(e) => cli.experiment = Some(e),
                    Err(e) => fail(e),
                }
            }
            "--telemetry-out" => cli.telemetry_out = Some(value(&mut i, "--telemetry-out", "path")),
            "--steps" => cli.print_steps = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_scenario(cli: &CliArgs) -> ScenarioConfig {
    let loaded = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(experiment) = cli.experiment {
        scenario.simulation.experiment = experiment;
    }
    scenario
}

fn file_name(policy: &str) -> String {
    let stem: String = policy
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{stem}.csv")
}

fn write_run<S: PlantState>(dir: &Path, run: &PolicyRun<S>) -> PathBuf {
    let path = dir.join(file_name(&run.kpis.policy));
    if let Err(e) = export_csv(&run.trajectory, &run.columns(), &path) {
        fail(format!("failed to write CSV \"{}\": {e}", path.display()));
    }
    path
}

fn export_all(dir: &Path, summary: &RunSummary) -> usize {
    if let Err(e) = fs::create_dir_all(dir) {
        fail(format!("cannot create \"{}\": {e}", dir.display()));
    }
    let mut written: Vec<PathBuf> = Vec::new();
    written.extend(summary.building.iter().map(|r| write_run(dir, r)));
    written.extend(summary.ev.iter().map(|r| write_run(dir, r)));
    written.extend(summary.water_heater.iter().map(|r| write_run(dir, r)));
    if let Some(climate) = &summary.climate {
        written.push(write_run(dir, &climate.nominal));
        written.extend(climate.perturbations.iter().map(|p| write_run(dir, &p.run)));
    }
    written.len()
}

fn print_steps<S: PlantState>(runs: &[PolicyRun<S>]) {
    for run in runs {
        println!("=== {} ===", run.kpis.policy);
        println!("{}", run.trajectory);
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = parse_args();
    let scenario = load_scenario(&cli);

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let summary = match run_scenario(&scenario) {
        Ok(summary) => summary,
        Err(e) => fail(e),
    };

    if cli.print_steps {
        print_steps(&summary.building);
        print_steps(&summary.ev);
        print_steps(&summary.water_heater);
        if let Some(climate) = &summary.climate {
            print_steps(std::slice::from_ref(&climate.nominal));
        }
    }

    for kpi in summary.kpis() {
        println!("{kpi}\n");
    }

    if let Some(climate) = &summary.climate {
        println!("--- Linearization error ---");
        for p in &climate.perturbations {
            println!("scale {:<8} max |x - x_lin| = {:.6e} K", p.scale, p.max_abs_error);
        }
        for pair in climate.perturbations.windows(2) {
            let ratio = pair[1].max_abs_error / pair[0].max_abs_error;
            println!(
                "error ratio {} -> {}: {ratio:.4} (perturbation ratio {:.4})",
                pair[0].scale,
                pair[1].scale,
                pair[1].scale / pair[0].scale
            );
        }
    }

    if let Some(ref dir) = cli.telemetry_out {
        let count = export_all(Path::new(dir), &summary);
        eprintln!("{count} telemetry files written to {dir}");
    }
}
