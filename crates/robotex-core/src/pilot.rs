use serde::{Deserialize, Serialize};

use crate::{Actuation, Side, VisionSnapshot};

/// What an onboard pilot can observe at the start of a tick.
#[derive(Debug, Clone, Copy)]
pub struct PilotInputs<'a> {
    pub side: Side,
    pub vision: &'a VisionSnapshot,
    /// Whether the dribbler held a ball during the previous tick
    pub has_ball: bool,
}

/// Debug state of a pilot, published with the match telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotDebug {
    pub state: String,
    pub state_duration: f64,
    pub guessed_goal_angle: f64,
}

/// Something that drives a robot from its own sensor readings.
///
/// A pilot is called once per tick before the physics step and returns the actuation
/// to apply. `current` is the actuation the robot holds right now, so a pilot only
/// needs to overwrite the fields it cares about.
pub trait Pilot: Send {
    fn name(&self) -> &str;

    fn drive(&mut self, inputs: &PilotInputs<'_>, current: &Actuation, dt: f64) -> Actuation;

    fn debug_state(&self) -> Option<PilotDebug> {
        None
    }
}
