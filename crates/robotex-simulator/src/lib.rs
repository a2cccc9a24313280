mod ball;
mod camera;
mod coilgun;
mod config;
mod dribbler;
mod goal;
mod models;
mod physics;
mod robot;
mod runner;
mod scoring;
mod simulation;
mod step;
mod utils;
mod wheel;
mod zone;

pub use ball::{Ball, BALL_MASS, BALL_RADIUS};
pub use camera::{Camera, CameraSpec};
pub use coilgun::{Coilgun, KICK_DELAY};
pub use config::*;
pub use dribbler::Dribbler;
pub use goal::Goal;
pub use models::{BodyMass, Drivetrain, RobotSpec};
pub use physics::{world_point, ContactEvent, EntityTag, PhysicsWorld};
pub use robot::{wheel_powers, DriveCommand, Robot};
pub use runner::{ControlMsg, MatchHandle, MatchRunner, RobotHandle, MAX_TIMEWARP};
pub use scoring::{resolve_contact, ContactEffect};
pub use simulation::{Match, MatchBuilder};
pub use step::{BallState, GoalState, StepContext, StepListener};
pub use utils::{FpsCounter, IntervalTrigger};
pub use wheel::{Wheel, WheelSpec};
pub use zone::{Zone, ZoneSpec};
