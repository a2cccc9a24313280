use serde::{Deserialize, Serialize};

use crate::{BallId, Side, Vector2};

/// A ball seen by a robot's camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallReading {
    pub id: BallId,
    /// Absolute position of the ball on the field \[m]
    pub position: Vector2,
    /// Distance from the camera to the ball \[m]
    pub distance: f64,
    /// Dot product of the unit direction to the ball with the robot's x axis, in [-1, 1].
    ///
    /// This is not an angle. It is zero for a target straight ahead and positive for
    /// targets counter-clockwise of the forward direction.
    pub bearing: f64,
}

/// A goal seen by a robot's camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalReading {
    pub side: Side,
    /// Absolute position of the goal center \[m]
    pub position: Vector2,
    /// Distance from the camera to the goal center \[m]
    pub distance: f64,
    /// Same dot-product bearing as [`BallReading::bearing`].
    pub bearing: f64,
}

impl BallReading {
    /// Projects the reading onto the robot frame as `(forward, left)` distances.
    pub fn forward_left(&self) -> (f64, f64) {
        project(self.distance, self.bearing)
    }
}

impl GoalReading {
    /// Projects the reading onto the robot frame as `(forward, left)` distances.
    pub fn forward_left(&self) -> (f64, f64) {
        project(self.distance, self.bearing)
    }
}

fn project(distance: f64, bearing: f64) -> (f64, f64) {
    (distance * bearing.cos(), distance * bearing.sin())
}

/// Everything a camera saw during one tick.
///
/// A snapshot is immutable once built. The simulation publishes a fresh one every
/// tick, so readers holding an older snapshot are never disturbed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionSnapshot {
    pub balls: Vec<BallReading>,
    pub goals: Vec<GoalReading>,
}

impl VisionSnapshot {
    pub fn ball(&self, id: BallId) -> Option<&BallReading> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn goal(&self, side: Side) -> Option<&GoalReading> {
        self.goals.iter().find(|g| g.side == side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_left_projection() {
        let reading = BallReading {
            id: 0,
            position: Vector2::zeros(),
            distance: 2.0,
            bearing: 0.0,
        };
        let (forward, left) = reading.forward_left();
        assert_relative_eq!(forward, 2.0);
        assert_relative_eq!(left, 0.0);

        let reading = BallReading {
            bearing: 0.5,
            ..reading
        };
        let (forward, left) = reading.forward_left();
        assert_relative_eq!(forward, 2.0 * 0.5f64.cos());
        assert_relative_eq!(left, 2.0 * 0.5f64.sin());
    }

    #[test]
    fn test_lookup() {
        let snapshot = VisionSnapshot {
            balls: vec![BallReading {
                id: 7,
                position: Vector2::new(1.0, 1.0),
                distance: 1.0,
                bearing: 0.1,
            }],
            goals: vec![GoalReading {
                side: Side::Blue,
                position: Vector2::new(0.0, 1.5),
                distance: 3.0,
                bearing: -0.2,
            }],
        };
        assert!(snapshot.ball(7).is_some());
        assert!(snapshot.ball(3).is_none());
        assert!(snapshot.goal(Side::Blue).is_some());
        assert!(snapshot.goal(Side::Yellow).is_none());
    }
}
