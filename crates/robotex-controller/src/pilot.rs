use robotex_core::{Actuation, Pilot, PilotDebug, PilotInputs};

use crate::{
    state::{transition, ControllerState, Scratch},
    ControllerParams,
};

/// Plays the game alone: finds balls, dribbles them and shoots at the opponent's goal.
#[derive(Debug, Clone)]
pub struct AutonomousPilot {
    params: ControllerParams,
    state: ControllerState,
    scratch: Scratch,
}

impl AutonomousPilot {
    pub fn new() -> Self {
        Self::with_params(ControllerParams::default())
    }

    pub fn with_params(params: ControllerParams) -> Self {
        AutonomousPilot {
            params,
            state: ControllerState::Start,
            scratch: Scratch::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }
}

impl Default for AutonomousPilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Pilot for AutonomousPilot {
    fn name(&self) -> &str {
        "autonomous"
    }

    fn drive(&mut self, inputs: &PilotInputs<'_>, current: &Actuation, dt: f64) -> Actuation {
        let scratch = std::mem::take(&mut self.scratch);
        let (state, scratch, actuation) =
            transition(self.state, scratch, inputs, &self.params, dt, *current);
        self.state = state;
        self.scratch = scratch;
        actuation
    }

    fn debug_state(&self) -> Option<PilotDebug> {
        Some(PilotDebug {
            state: self.state.to_string(),
            state_duration: self.scratch.state_duration,
            guessed_goal_angle: self.scratch.guessed_goal_angle,
        })
    }
}
