//! Error types shared by the simulation core.

use thiserror::Error;

/// Result alias used throughout the simulation core.
pub type SimResult<T> = Result<T, SimError>;

/// Failures of a simulation run.
///
/// Everything except [`SimError::Integration`] is a caller precondition
/// violation and is detected before the first step is taken. Saturation of
/// an action at its capacity bound is not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("time step must be positive and finite, got {0}")]
    NonPositiveTimestep(f64),

    #[error("infeasible bounds at step {step}: min {min} exceeds max {max}")]
    InfeasibleBounds { step: usize, min: f64, max: f64 },

    #[error("invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("integration failed at step {step}: {reason}")]
    Integration { step: usize, reason: String },
}

/// Returns `Ok(())` when `actual == expected`, otherwise a [`SimError::LengthMismatch`].
pub fn ensure_len(what: &'static str, expected: usize, actual: usize) -> SimResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SimError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Rejects zero, negative and non-finite step durations.
pub fn ensure_timestep(dt: f64) -> SimResult<f64> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(SimError::NonPositiveTimestep(dt))
    }
}

/// Rejects parameters that must be strictly positive.
pub fn ensure_positive(what: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { what, value })
    }
}
