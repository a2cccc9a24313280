mod params;
mod pilot;
mod state;

pub use params::ControllerParams;
pub use pilot::AutonomousPilot;
pub use state::{transition, ControllerState, Scratch};
