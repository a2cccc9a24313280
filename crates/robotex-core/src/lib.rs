mod actuation;
mod angle;
mod geom;
mod pilot;
mod side;
mod telemetry;
mod vision;

pub use actuation::*;
pub use angle::*;
pub use geom::*;
pub use pilot::*;
pub use side::*;
pub use telemetry::*;
pub use vision::*;

pub type Vector2 = nalgebra::Vector2<f64>;

/// Identifier of a ball, unique within one match.
pub type BallId = u32;
