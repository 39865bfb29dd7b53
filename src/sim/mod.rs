/// Simulation clock for timestep management.
pub mod clock;
/// Exact zero-order-hold discretization.
pub mod discretize;
pub mod engine;
pub mod kpi;
/// Adaptive Runge-Kutta integration.
pub mod ode;
pub mod types;
