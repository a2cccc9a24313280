use rapier2d_f64::prelude::*;
use robotex_core::{polygon_contains, Angle, Vector2};

use crate::physics::world_point;

/// Geometry of a ball-interaction zone, in the robot frame.
#[derive(Debug, Clone, Copy)]
pub struct ZoneSpec {
    /// Mount point on the chassis
    pub mount: Vector2,
    /// Rotation of the zone around the mount, in degrees
    pub angle: f64,
    /// Width at the mount end
    pub near_width: f64,
    /// Width at the far end
    pub far_width: f64,
    /// How far the zone reaches from the mount
    pub range: f64,
}

/// A trapezoid in front of a mount point, narrow at the mount and widening toward its
/// range. The zone extends toward the chassis front (local -y) and is shifted forward
/// by the ball radius so it covers ball centers rather than ball edges.
#[derive(Debug, Clone)]
pub struct Zone {
    mount: Vector2,
    outline: [Vector2; 4],
}

impl Zone {
    pub fn new(spec: &ZoneSpec, ball_radius: f64) -> Self {
        let rotation = Angle::from_degrees(spec.angle);
        let near = -ball_radius;
        let far = near - spec.range;
        // counter-clockwise
        let corners = [
            Vector2::new(-spec.near_width / 2.0, near),
            Vector2::new(-spec.far_width / 2.0, far),
            Vector2::new(spec.far_width / 2.0, far),
            Vector2::new(spec.near_width / 2.0, near),
        ];
        Zone {
            mount: spec.mount,
            outline: corners.map(|corner| spec.mount + rotation * corner),
        }
    }

    /// Outline in the robot frame.
    pub fn outline(&self) -> &[Vector2; 4] {
        &self.outline
    }

    /// Mount point in world space.
    pub fn mount_world(&self, pose: &Isometry<Real>) -> Vector2 {
        world_point(pose, self.mount)
    }

    /// Outline in world space for the given chassis pose.
    pub fn world_outline(&self, pose: &Isometry<Real>) -> [Vector2; 4] {
        self.outline.map(|corner| world_point(pose, corner))
    }

    pub fn contains(&self, world_outline: &[Vector2; 4], point: Vector2) -> bool {
        polygon_contains(world_outline, point)
    }
}
