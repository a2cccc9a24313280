use serde::{Deserialize, Serialize};

/// Continuous drive inputs of a robot plus the one-shot kick request.
///
/// Values are written last-writer-wins; there is no consistency guarantee between
/// fields written by different sources within one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Actuation {
    /// Desired thrust direction in the robot frame \[rad], 0 is straight ahead
    pub heading: f64,
    /// Thrust magnitude in [0, 1]
    pub power: f64,
    /// Desired turn rate in [-1, 1], positive is counter-clockwise
    pub yaw_rate: f64,
    /// Arm the coilgun for the next tick
    pub kick: bool,
}

impl Actuation {
    pub fn stopped() -> Self {
        Self::default()
    }
}
