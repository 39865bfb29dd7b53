//! Simulation engine that runs one control policy against one plant.

use tracing::{debug, trace};

use crate::controllers::{Controller, StepContext};
use crate::devices::types::Plant;
use crate::error::{SimResult, ensure_len};

use super::clock::Clock;
use super::types::{CapacityBounds, SimConfig, Trajectory};

/// Simulation engine owning a plant, a policy, and the exogenous inputs.
///
/// Generic over `P: Plant` and `C: Controller` for static dispatch. All
/// inputs are validated in [`Engine::new`]; [`Engine::run`] only fails if
/// the plant's state update does.
pub struct Engine<P: Plant, C: Controller<P::State>> {
    config: SimConfig,
    plant: P,
    controller: C,
    disturbance: Vec<f64>,
    bounds: CapacityBounds,
}

impl<P: Plant, C: Controller<P::State>> Engine<P, C> {
    /// Creates a new simulation engine.
    ///
    /// The horizon `K` is the disturbance length.
    ///
    /// # Arguments
    ///
    /// * `config` - Step duration and start time
    /// * `plant` - State updater
    /// * `controller` - Control policy
    /// * `disturbance` - Per-step exogenous input (K)
    /// * `bounds` - Per-step action bounds (K)
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the bounds are misaligned with the
    /// disturbance or infeasible at some step, or the policy's own schedule
    /// does not cover the horizon.
    pub fn new(
        config: SimConfig,
        plant: P,
        controller: C,
        disturbance: Vec<f64>,
        bounds: CapacityBounds,
    ) -> SimResult<Self> {
        let steps = disturbance.len();
        ensure_len("bounds", steps, bounds.len())?;
        bounds.validate()?;
        controller.check_horizon(steps)?;

        Ok(Self {
            config,
            plant,
            controller,
            disturbance,
            bounds,
        })
    }

    /// Number of steps `K`.
    pub fn steps(&self) -> usize {
        self.disturbance.len()
    }

    /// Runs the loop `decide -> clip -> step -> record` from `initial`.
    ///
    /// # Errors
    ///
    /// Propagates the first state-update failure; no partial trajectory is
    /// returned.
    pub fn run(&self, initial: P::State) -> SimResult<Trajectory<P::State>> {
        let steps = self.steps();
        let mut clock = Clock::new(steps, self.config.dt_hours, self.config.start_hour);
        let mut trajectory = Trajectory::with_capacity(steps);
        let mut state = initial;
        let mut mode = self.controller.initial_mode();

        debug!(
            plant = self.plant.plant_type(),
            policy = self.controller.name(),
            steps,
            dt_hours = self.config.dt_hours,
            "starting run"
        );

        while let Some(tick) = clock.tick() {
            let k = tick.step;
            let ctx = StepContext {
                step: k,
                time_hr: tick.time_hr,
                disturbance: self.disturbance[k],
                min: self.bounds.min(k),
                max: self.bounds.max(k),
            };

            let decision = self.controller.decide(&state, mode, &ctx);
            let action = ctx.clip(decision.action);
            if action != decision.action {
                trace!(step = k, requested = decision.action, action, "action saturated");
            }

            let next = self.plant.step(&state, action, ctx.disturbance, k)?;

            trajectory.times_hr.push(tick.time_hr);
            trajectory.states.push(state);
            trajectory.actions.push(action);
            trajectory.requested.push(decision.action);
            trajectory.disturbances.push(ctx.disturbance);
            trajectory.modes.push(decision.mode);

            state = next;
            mode = decision.mode;
        }

        trajectory.times_hr.push(clock.time_at(steps));
        trajectory.states.push(state);

        debug!(
            policy = self.controller.name(),
            saturated = trajectory.saturated_steps(),
            "run complete"
        );
        Ok(trajectory)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn plant(&self) -> &P {
        &self.plant
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }
}
