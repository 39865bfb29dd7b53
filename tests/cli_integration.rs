use std::process::Command;

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_energy-control-sim"))
        .args(args)
        .output()
        .expect("energy-control-sim process should run")
}

fn metric(stdout: &str, policy: &str, label: &str, unit: &str) -> f64 {
    let header = format!("--- KPI Report ({policy}) ---");
    let block = stdout
        .split_once(&header)
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| panic!("missing report for {policy} in output: {stdout}"));
    let line = block
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` for {policy}"));
    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));
    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from KPI line `{line}`"))
}

#[test]
fn cold_snap_saturates_more_than_baseline() {
    let baseline = run(&["--preset", "baseline", "--experiment", "building"]);
    let cold = run(&["--scenario", "scenarios/cold_snap.toml"]);
    assert!(baseline.status.success(), "{}", String::from_utf8_lossy(&baseline.stderr));
    assert!(cold.status.success(), "{}", String::from_utf8_lossy(&cold.stderr));

    let base_out = String::from_utf8_lossy(&baseline.stdout);
    let cold_out = String::from_utf8_lossy(&cold.stdout);
    let policy = "building/thermostat";
    let base_energy = metric(&base_out, policy, "Input energy:", "kWh") / 5.0;
    let cold_energy = metric(&cold_out, policy, "Input energy:", "kWh") / 3.0;
    assert!(
        cold_energy > base_energy,
        "daily heating should grow in the cold: {base_energy:.2} vs {cold_energy:.2}"
    );
    assert!(!cold_out.contains("--- KPI Report (ev/"));
}

#[test]
fn seed_override_changes_draws() {
    let a = run(&["--scenario", "scenarios/small_tank.toml", "--seed", "1"]);
    let b = run(&["--scenario", "scenarios/small_tank.toml", "--seed", "2"]);
    assert!(a.status.success() && b.status.success());
    let policy = "water-heater/resistance";
    let ea = metric(&String::from_utf8_lossy(&a.stdout), policy, "Input energy:", "kWh");
    let eb = metric(&String::from_utf8_lossy(&b.stdout), policy, "Input energy:", "kWh");
    assert!((ea - eb).abs() > 1e-6);
}

#[test]
fn telemetry_is_written_per_policy() {
    let dir = std::env::temp_dir().join(format!("energy-control-sim-{}", std::process::id()));
    let out = run(&[
        "--preset",
        "small_tank",
        "--experiment",
        "water-heater",
        "--telemetry-out",
        dir.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    for name in ["water-heater_resistance", "water-heater_heat-pump", "water-heater_hybrid"] {
        let path = dir.join(format!("{name}.csv"));
        let text = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("missing {}: {e}", path.display()));
        assert!(text.starts_with("step,time_hr,x,action,requested,disturbance,mode,draw_kw,electrical_kw"));
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_arguments_fail() {
    assert!(!run(&["--bogus"]).status.success());
    assert!(!run(&["--experiment", "solar"]).status.success());
    assert!(!run(&["--preset", "nope"]).status.success());
}
