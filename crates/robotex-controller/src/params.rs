use serde::{Deserialize, Serialize};

/// Tuning of the autonomous controller. Times are in seconds, distances in meters and
/// angles in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParams {
    /// How long to drive away from the starting corner
    pub start_time: f64,
    /// How long to spin looking for the closest ball
    pub spin_search_time: f64,
    /// How long to look for the closest ball again after spinning
    pub refind_time: f64,
    /// How long to drive when relocating
    pub relocate_time: f64,
    /// Distances closer than this are considered the same
    pub distance_tolerance: f64,
    /// A ball this close is taken without looking for closer ones
    pub close_enough: f64,
    /// Start driving toward the target once it is within this angle
    pub max_approach_angle: f64,
    /// Longest time any state except ball search may last
    pub max_state_duration: f64,
    /// Length of the turn pulses when fetching or first sighting the goal
    pub brake_time: f64,
    /// How many degrees the goal angle guess moves per unit of yaw rate per second
    pub guessed_angle_gain: f64,
}

impl Default for ControllerParams {
    fn default() -> Self {
        ControllerParams {
            start_time: 2.0,
            spin_search_time: 2.0,
            refind_time: 4.0,
            relocate_time: 2.0,
            distance_tolerance: 0.8,
            close_enough: 1.2,
            max_approach_angle: 20.0,
            max_state_duration: 10.0,
            brake_time: 0.2,
            guessed_angle_gain: 200.0,
        }
    }
}
