//! Post-hoc KPI computation from simulation results.

use std::fmt;

use crate::devices::types::PlantState;

use super::types::Trajectory;

/// Aggregate key performance indicators derived from a complete run.
///
/// Computed post-hoc from a [`Trajectory`] so the reported metrics always
/// agree with the recorded data.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    /// Policy the run used.
    pub policy: String,
    /// Root-mean-square error of the tracked state against its reference,
    /// over states `1..=K`. `None` when there is no reference.
    pub rmse_tracking: Option<f64>,
    /// Mean absolute tracking error, same convention.
    pub mae_tracking: Option<f64>,
    /// Input energy `sum(max(p, 0) dt)` (kWh).
    pub energy_kwh: f64,
    /// Largest input power (kW).
    pub peak_power_kw: f64,
    /// Steps where the policy's request was clipped.
    pub saturated_steps: usize,
    /// Smallest tracked state.
    pub min_state: f64,
    /// Largest tracked state.
    pub max_state: f64,
}

impl KpiReport {
    /// Computes all KPIs from one trajectory.
    ///
    /// # Arguments
    ///
    /// * `policy` - Policy name for the report header
    /// * `trajectory` - Complete simulation run
    /// * `reference` - Optional setpoint for the tracked state (K+1)
    /// * `power_kw` - Input power per step (K); the action itself for
    ///   electrically driven plants
    /// * `dt_hours` - Timestep duration in hours
    pub fn from_trajectory<S: PlantState>(
        policy: &str,
        trajectory: &Trajectory<S>,
        reference: Option<&[f64]>,
        power_kw: &[f64],
        dt_hours: f64,
    ) -> Self {
        let tracked = trajectory.tracked();

        let (rmse_tracking, mae_tracking) = match reference {
            Some(reference) if tracked.len() > 1 => {
                let errors: Vec<f64> = tracked
                    .iter()
                    .zip(reference)
                    .skip(1)
                    .map(|(x, r)| x - r)
                    .collect();
                let n = errors.len() as f64;
                let sq_sum: f64 = errors.iter().map(|e| e * e).sum();
                let abs_sum: f64 = errors.iter().map(|e| e.abs()).sum();
                (Some((sq_sum / n).sqrt()), Some(abs_sum / n))
            }
            _ => (None, None),
        };

        let energy_kwh = power_kw.iter().map(|p| p.max(0.0) * dt_hours).sum();
        let peak_power_kw = power_kw.iter().copied().fold(0.0_f64, f64::max);
        let min_state = tracked.iter().copied().fold(f64::INFINITY, f64::min);
        let max_state = tracked.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            policy: policy.to_string(),
            rmse_tracking,
            mae_tracking,
            energy_kwh,
            peak_power_kw,
            saturated_steps: trajectory.saturated_steps(),
            min_state,
            max_state,
        }
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ({}) ---", self.policy)?;
        writeln!(f, "RMSE tracking error:   {}", fmt_optional(self.rmse_tracking))?;
        writeln!(f, "MAE tracking error:    {}", fmt_optional(self.mae_tracking))?;
        writeln!(f, "Input energy:          {:.2} kWh", self.energy_kwh)?;
        writeln!(f, "Peak input power:      {:.2} kW", self.peak_power_kw)?;
        writeln!(f, "Saturated steps:       {}", self.saturated_steps)?;
        write!(
            f,
            "State range:           {:.3} .. {:.3}",
            self.min_state, self.max_state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::Switch;

    fn trajectory(states: Vec<f64>, actions: Vec<f64>, requested: Vec<f64>) -> Trajectory<f64> {
        let k = actions.len();
        Trajectory {
            times_hr: (0..=k).map(|i| i as f64).collect(),
            states,
            actions,
            requested,
            disturbances: vec![0.0; k],
            modes: vec![Switch::Off; k],
        }
    }

    #[test]
    fn rmse_skips_the_initial_state() {
        // errors after the initial state: [1, -1, 2, -2] -> mean square 2.5
        let traj = trajectory(
            vec![100.0, 1.0, -1.0, 2.0, -2.0],
            vec![0.0; 4],
            vec![0.0; 4],
        );
        let kpi = KpiReport::from_trajectory("t", &traj, Some(&[0.0; 5]), &traj.actions, 1.0);
        assert!((kpi.rmse_tracking.unwrap() - 2.5_f64.sqrt()).abs() < 1e-12);
        assert!((kpi.mae_tracking.unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn energy_counts_positive_power_only() {
        let traj = trajectory(vec![0.0; 5], vec![2.0, -3.0, 1.0, 4.0], vec![2.0, -3.0, 1.0, 9.0]);
        let kpi = KpiReport::from_trajectory("t", &traj, None, &traj.actions, 0.5);
        assert!((kpi.energy_kwh - 3.5).abs() < 1e-12);
        assert_eq!(kpi.peak_power_kw, 4.0);
        assert_eq!(kpi.saturated_steps, 1);
        assert_eq!(kpi.rmse_tracking, None);
    }

    #[test]
    fn state_range() {
        let traj = trajectory(vec![3.0, -1.0, 7.0], vec![0.0; 2], vec![0.0; 2]);
        let kpi = KpiReport::from_trajectory("t", &traj, None, &traj.actions, 1.0);
        assert_eq!(kpi.min_state, -1.0);
        assert_eq!(kpi.max_state, 7.0);
        assert!(kpi.to_string().contains("n/a"));
    }
}
