use std::sync::Arc;

use rapier2d_f64::prelude::*;
use robotex_core::{polygon_contains, BallReading, GoalReading, Vector2, VisionSnapshot};

use crate::{
    physics::world_point,
    step::{BallState, GoalState},
};

#[derive(Debug, Clone, Copy)]
pub struct CameraSpec {
    /// Mount point on the chassis \[m]
    pub mount: Vector2,
    /// Direction the camera looks in, relative to the chassis x axis \[deg]
    pub angle: f64,
    /// Full field-of-view angle \[deg]
    pub field_of_view: f64,
    /// Maximum viewing distance \[m]
    pub range: f64,
}

/// An onboard camera with a triangular field of view.
///
/// Each call to [`Camera::sense`] builds a new [`VisionSnapshot`] and swaps it in, so
/// a reader holding the previous snapshot is never affected by the rebuild.
#[derive(Debug, Clone)]
pub struct Camera {
    mount: Vector2,
    view: [Vector2; 3],
    snapshot: Arc<VisionSnapshot>,
}

impl Camera {
    pub fn new(spec: &CameraSpec) -> Self {
        let left = (spec.angle - spec.field_of_view / 2.0).to_radians();
        let right = (spec.angle + spec.field_of_view / 2.0).to_radians();
        let view = [
            Vector2::zeros(),
            Vector2::new(left.cos(), left.sin()) * spec.range,
            Vector2::new(right.cos(), right.sin()) * spec.range,
        ];

        Camera {
            mount: spec.mount,
            view,
            snapshot: Arc::new(VisionSnapshot::default()),
        }
    }

    /// The visibility triangle in world space for the given chassis pose.
    pub fn view_polygon(&self, pose: &Isometry<Real>) -> [Vector2; 3] {
        self.view
            .map(|corner| world_point(pose, corner + self.mount))
    }

    /// Recomputes what the camera sees from the chassis pose.
    pub fn sense(&mut self, pose: &Isometry<Real>, balls: &[BallState], goals: &[GoalState]) {
        let view = self.view_polygon(pose);
        let camera = world_point(pose, self.mount);
        let x_axis = pose.rotation * Vector2::x();

        let balls = balls
            .iter()
            .filter(|ball| polygon_contains(&view, ball.position))
            .map(|ball| {
                let (distance, bearing) = range_and_bearing(camera, x_axis, ball.position);
                BallReading {
                    id: ball.id,
                    position: ball.position,
                    distance,
                    bearing,
                }
            })
            .collect();
        let goals = goals
            .iter()
            .filter(|goal| polygon_contains(&view, goal.position))
            .map(|goal| {
                let (distance, bearing) = range_and_bearing(camera, x_axis, goal.position);
                GoalReading {
                    side: goal.side,
                    position: goal.position,
                    distance,
                    bearing,
                }
            })
            .collect();

        self.snapshot = Arc::new(VisionSnapshot { balls, goals });
    }

    /// The latest readings.
    pub fn snapshot(&self) -> Arc<VisionSnapshot> {
        Arc::clone(&self.snapshot)
    }
}

/// Distance from the camera to `target` and the dot product of the unit direction to
/// the target with the chassis x axis.
fn range_and_bearing(camera: Vector2, x_axis: Vector2, target: Vector2) -> (f64, f64) {
    let offset = target - camera;
    let bearing = offset
        .try_normalize(f64::EPSILON)
        .map(|heading| heading.dot(&x_axis.normalize()))
        .unwrap_or(0.0);
    (offset.norm(), bearing)
}
