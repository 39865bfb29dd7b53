//! Exact zero-order-hold discretization of linear time-invariant dynamics.

use nalgebra::{DMatrix, SMatrix, SVector};

use crate::error::{SimResult, ensure_positive, ensure_timestep};

/// Discrete-time pair `(A, B)` for `x⁺ = A x + B u`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteLti<const N: usize> {
    pub a: SMatrix<f64, N, N>,
    pub b: SVector<f64, N>,
}

/// Discretizes `dx/dt = Ac x + Bc u` with `u` held constant over `dt`.
///
/// Uses the matrix exponential of the augmented generator
///
/// ```text
/// exp([[Ac, Bc], [0, 0]] dt) = [[A, B], [0, 1]]
/// ```
///
/// which is exact for the continuous-time model.
///
/// # Errors
///
/// Returns [`crate::error::SimError::NonPositiveTimestep`] if `dt` is not
/// strictly positive.
///
/// # Examples
///
/// ```
/// use energy_control_sim::sim::discretize::discretize;
/// use nalgebra::{SMatrix, SVector};
///
/// let ac = SMatrix::<f64, 1, 1>::new(-0.5);
/// let bc = SVector::<f64, 1>::new(1.0);
/// let d = discretize(&ac, &bc, 2.0).unwrap();
/// assert!((d.a[(0, 0)] - (-1.0_f64).exp()).abs() < 1e-12);
/// ```
pub fn discretize<const N: usize>(
    ac: &SMatrix<f64, N, N>,
    bc: &SVector<f64, N>,
    dt: f64,
) -> SimResult<DiscreteLti<N>> {
    ensure_timestep(dt)?;

    let mut generator = DMatrix::<f64>::zeros(N + 1, N + 1);
    for i in 0..N {
        for j in 0..N {
            generator[(i, j)] = ac[(i, j)] * dt;
        }
        generator[(i, N)] = bc[i] * dt;
    }
    let phi = generator.exp();

    Ok(DiscreteLti {
        a: SMatrix::from_fn(|i, j| phi[(i, j)]),
        b: SVector::from_fn(|i, _| phi[(i, N)]),
    })
}

/// Scalar discretization of `dx/dt = -x/tau + u`.
///
/// `a = exp(-dt/tau)` and `b = (1 - a) tau`, the closed form of the 1×1
/// matrix exponential.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrder {
    pub a: f64,
    pub b: f64,
}

impl FirstOrder {
    /// Builds the discrete coefficients from a time constant and step duration.
    ///
    /// # Errors
    ///
    /// Fails when `tau` or `dt` is not strictly positive.
    pub fn from_time_constant(tau: f64, dt: f64) -> SimResult<Self> {
        let tau = ensure_positive("tau", tau)?;
        let dt = ensure_timestep(dt)?;
        let a = (-dt / tau).exp();
        Ok(Self { a, b: (1.0 - a) * tau })
    }

    /// `a x + b u`.
    pub fn apply(&self, x: f64, u: f64) -> f64 {
        self.a * x + self.b * u
    }
}
