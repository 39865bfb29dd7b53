use super::types::{Controller, Decision, StepContext, Switch};
use crate::devices::types::PlantState;
use crate::error::{SimResult, ensure_len};

/// Replays a precomputed action sequence, ignoring the state.
///
/// Used for exogenously scheduled actions such as the emissivity path of the
/// climate model.
#[derive(Debug, Clone)]
pub struct OpenLoop {
    actions: Vec<f64>,
}

impl OpenLoop {
    pub fn new(actions: Vec<f64>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[f64] {
        &self.actions
    }
}

impl<S: PlantState> Controller<S> for OpenLoop {
    fn decide(&self, _state: &S, mode: Switch, ctx: &StepContext) -> Decision {
        Decision::new(self.actions[ctx.step], mode)
    }

    fn check_horizon(&self, steps: usize) -> SimResult<()> {
        ensure_len("open-loop actions", steps, self.actions.len())
    }

    fn name(&self) -> &'static str {
        "open-loop"
    }
}
