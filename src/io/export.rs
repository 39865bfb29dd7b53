//! CSV export for simulation trajectories.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::devices::types::PlantState;
use crate::sim::types::Trajectory;

/// Extra per-sample column written next to the trajectory (e.g. a setpoint).
///
/// Values are indexed like states; a series shorter than `K + 1` leaves the
/// remaining cells empty.
pub struct Column<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// Exports a trajectory to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv<S: PlantState>(
    trajectory: &Trajectory<S>,
    extra: &[Column<'_>],
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(trajectory, extra, buf)
}

/// Writes a trajectory as CSV to any writer.
///
/// One row per state sample (`K + 1` rows). Columns are `step`, `time_hr`,
/// one column per state component, `action`, `requested`, `disturbance`,
/// `mode`, then the extra columns. Step-indexed cells of the final row are
/// empty. Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv<S: PlantState>(
    trajectory: &Trajectory<S>,
    extra: &[Column<'_>],
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["step", "time_hr"];
    header.extend(S::LABELS);
    header.extend(["action", "requested", "disturbance", "mode"]);
    header.extend(extra.iter().map(|c| c.name));
    wtr.write_record(&header)?;

    let steps = trajectory.steps();
    let cell = |values: &[f64], k: usize| values.get(k).map_or_else(String::new, |v| format!("{v:.6}"));

    for (k, state) in trajectory.states.iter().enumerate() {
        let mut row = vec![k.to_string(), format!("{:.4}", trajectory.times_hr[k])];
        row.extend(state.components().iter().map(|v| format!("{v:.6}")));
        row.push(cell(&trajectory.actions, k));
        row.push(cell(&trajectory.requested, k));
        row.push(cell(&trajectory.disturbances, k));
        row.push(if k < steps {
            trajectory.modes[k].to_string()
        } else {
            String::new()
        });
        row.extend(extra.iter().map(|c| cell(c.values, k)));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
