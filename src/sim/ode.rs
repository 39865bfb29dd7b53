//! Adaptive integration of scalar ODEs over a single interval.
//!
//! Thin layer over [`ode_solvers::Dopri5`]: fixes the step-size controller
//! settings, applies a per-interval step budget and turns solver failures
//! into [`OdeError`].

use nalgebra::Vector1;
use ode_solvers::dop_shared::OutputType;
use ode_solvers::{Dopri5, System};
use thiserror::Error;

/// Absolute and relative error tolerances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-10,
            rel: 1e-10,
        }
    }
}

/// Reasons an interval could not be integrated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdeError {
    #[error("invalid interval [{t0}, {t1}]")]
    InvalidInterval { t0: f64, t1: f64 },

    #[error("solver stopped: {0}")]
    Solver(String),

    #[error("non-finite state {value} at the end of the interval")]
    NonFinite { value: f64 },
}

/// Dormand-Prince 5(4) settings for one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSolver {
    pub tol: Tolerances,
    /// Accepted plus rejected steps allowed per call.
    pub max_steps: u32,
}

impl Default for ScalarSolver {
    fn default() -> Self {
        Self::new(Tolerances::default())
    }
}

impl ScalarSolver {
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            max_steps: 100_000,
        }
    }

    /// Sets the per-call step budget, saturating at `u32::MAX`.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = u32::try_from(max_steps).unwrap_or(u32::MAX);
        self
    }

    /// Integrates `system` from `(t0, x0)` to `t1` and returns `x(t1)`.
    ///
    /// # Errors
    ///
    /// Returns an [`OdeError`] when the interval is empty or reversed, the
    /// solver gives up (step budget, step-size underflow, stiffness), or the
    /// end state is not finite.
    pub fn integrate<F>(&self, system: F, t0: f64, t1: f64, x0: f64) -> Result<f64, OdeError>
    where
        F: System<f64, Vector1<f64>>,
    {
        let span = t1 - t0;
        if !(span.is_finite() && span > 0.0) {
            return Err(OdeError::InvalidInterval { t0, t1 });
        }

        let mut stepper = Dopri5::from_param(
            system,
            t0,
            t1,
            0.0,
            Vector1::new(x0),
            self.tol.rel,
            self.tol.abs,
            0.9,
            0.04,
            0.2,
            10.0,
            span,
            0.0,
            self.max_steps,
            1000,
            OutputType::Sparse,
        );
        stepper
            .integrate()
            .map_err(|e| OdeError::Solver(format!("{e:?}")))?;

        let value = stepper.y_out().last().map_or(f64::NAN, |y| y[0]);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(OdeError::NonFinite { value })
        }
    }
}
